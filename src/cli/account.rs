use std::io::{self, Write};

use clap::{Args, Subcommand};
use storefront::auth::{
    LoginForm, PointKind, ProfileUpdate, SignupForm, SocialProvider, UserSession,
};

use crate::cli::{Shop, output_error};

#[derive(Debug, Args)]
pub(crate) struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Sign in with email and password
    Login {
        /// Email address
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long, env = "SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Signup(SignupArgs),

    /// Sign in through a social provider
    Social {
        /// Provider
        #[arg(value_enum)]
        provider: SocialProvider,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Change profile fields
    Profile(ProfileArgs),

    /// Change the password
    Password {
        /// Current password
        #[arg(long)]
        current: String,

        /// New password
        #[arg(long)]
        new: String,
    },

    /// Delete the account along with the cart and wishlist
    Delete {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Points balance and history
    Points(PointsCommand),
}

#[derive(Debug, Args)]
struct SignupArgs {
    /// Email address
    #[arg(long)]
    email: String,

    /// Password
    #[arg(long, env = "SHOP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Password again; defaults to the password
    #[arg(long)]
    confirm_password: Option<String>,

    /// Display name
    #[arg(long)]
    name: String,

    /// Mobile number, e.g. 010-1234-5678
    #[arg(long)]
    phone: String,

    /// Birth date
    #[arg(long)]
    birth_date: Option<String>,

    /// Accept the terms of service
    #[arg(long)]
    agree_terms: bool,

    /// Accept the privacy policy
    #[arg(long)]
    agree_privacy: bool,

    /// Receive marketing messages
    #[arg(long)]
    agree_marketing: bool,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    /// Display name
    #[arg(long)]
    name: Option<String>,

    /// Mobile number
    #[arg(long)]
    phone: Option<String>,

    /// Birth date
    #[arg(long)]
    birth_date: Option<String>,

    /// Avatar URL
    #[arg(long)]
    profile_image: Option<String>,
}

#[derive(Debug, Args)]
struct PointsCommand {
    #[command(subcommand)]
    command: Option<PointsSubcommand>,
}

#[derive(Debug, Subcommand)]
enum PointsSubcommand {
    /// Credit points
    Add {
        /// Points to credit
        amount: u64,

        /// Why
        #[arg(long, default_value = "Manual credit")]
        reason: String,
    },

    /// Spend points
    Use {
        /// Points to spend
        amount: u64,

        /// Why
        #[arg(long, default_value = "Manual use")]
        reason: String,
    },

    /// Show the points history
    History,
}

pub(crate) fn run(command: AccountCommand, shop: &mut Shop) -> Result<(), String> {
    match command.command {
        AccountSubcommand::Login { email, password } => {
            let user = shop
                .login(&LoginForm::new(email, password))
                .map_err(|error| error.to_string())?;

            write_user(user)
        }
        AccountSubcommand::Signup(args) => {
            let form = SignupForm {
                confirm_password: args.confirm_password.unwrap_or_else(|| args.password.clone()),
                email: args.email,
                password: args.password,
                name: args.name,
                phone: args.phone,
                birth_date: args.birth_date,
                agree_terms: args.agree_terms,
                agree_privacy: args.agree_privacy,
                agree_marketing: args.agree_marketing,
            };

            let user = shop.signup(&form).map_err(|error| error.to_string())?;

            write_user(user)
        }
        AccountSubcommand::Social { provider } => {
            let user = shop
                .social_login(provider)
                .map_err(|error| error.to_string())?;

            write_user(user)
        }
        AccountSubcommand::Logout => {
            shop.logout()
                .map_err(|error| format!("failed to sign out: {error}"))?
                .ok_or_else(|| "not signed in".to_string())?;

            Ok(())
        }
        AccountSubcommand::Whoami => match shop.auth().user() {
            Some(user) => write_user(user),
            None => writeln!(io::stdout().lock(), "not signed in").map_err(output_error),
        },
        AccountSubcommand::Profile(args) => {
            let update = ProfileUpdate {
                name: args.name,
                phone: args.phone,
                birth_date: args.birth_date,
                profile_image: args.profile_image,
                preferences: None,
            };

            let user = shop
                .update_profile(update)
                .map_err(|error| error.to_string())?;

            write_user(user)
        }
        AccountSubcommand::Password { current, new } => shop
            .change_password(&current, &new)
            .map_err(|error| error.to_string()),
        AccountSubcommand::Delete { yes } => {
            if !yes {
                return Err("pass --yes to delete the account".to_string());
            }

            shop.delete_account()
                .map_err(|error| error.to_string())?;

            Ok(())
        }
        AccountSubcommand::Points(points) => run_points(points, shop),
    }
}

fn run_points(command: PointsCommand, shop: &mut Shop) -> Result<(), String> {
    let mut out = io::stdout().lock();

    match command.command {
        Some(PointsSubcommand::Add { amount, reason }) => {
            let balance = shop
                .add_points(amount, &reason)
                .map_err(|error| error.to_string())?;

            writeln!(out, "points: {balance}").map_err(output_error)
        }
        Some(PointsSubcommand::Use { amount, reason }) => {
            let balance = shop
                .use_points(amount, &reason)
                .map_err(|error| error.to_string())?;

            writeln!(out, "points: {balance}").map_err(output_error)
        }
        Some(PointsSubcommand::History) => {
            let user = shop.auth().user().ok_or_else(|| "not signed in".to_string())?;

            if user.point_history.is_empty() {
                return writeln!(out, "no points history").map_err(output_error);
            }

            for entry in &user.point_history {
                let sign = match entry.kind {
                    PointKind::Earn => '+',
                    PointKind::Use => '-',
                };

                writeln!(
                    out,
                    "{}  {sign}{}  {}",
                    entry.date.strftime("%Y-%m-%d %H:%M"),
                    entry.amount,
                    entry.reason
                )
                .map_err(output_error)?;
            }

            Ok(())
        }
        None => {
            let user = shop.auth().user().ok_or_else(|| "not signed in".to_string())?;

            writeln!(out, "points: {}", user.points).map_err(output_error)
        }
    }
}

fn write_user(user: &UserSession) -> Result<(), String> {
    let mut out = io::stdout().lock();

    writeln!(out, "user_id: {}", user.id).map_err(output_error)?;
    writeln!(out, "name: {}", user.name).map_err(output_error)?;
    writeln!(out, "email: {}", user.email).map_err(output_error)?;
    if let Some(phone) = &user.phone {
        writeln!(out, "phone: {phone}").map_err(output_error)?;
    }
    if let Some(provider) = user.provider {
        writeln!(out, "provider: {provider}").map_err(output_error)?;
    }
    writeln!(
        out,
        "grade: {} ({}% member discount)",
        user.grade,
        user.grade.discount_percent()
    )
    .map_err(output_error)?;
    writeln!(out, "points: {}", user.points).map_err(output_error)?;
    writeln!(out, "joined: {}", user.join_date.strftime("%Y-%m-%d")).map_err(output_error)?;

    for benefit in user.grade.benefits() {
        writeln!(out, "  - {benefit}").map_err(output_error)?;
    }

    Ok(())
}
