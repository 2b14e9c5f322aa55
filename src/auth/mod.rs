//! Mock Authentication
//!
//! Session state for a shop with no backend. Logins always succeed once the form validates; the
//! issued token is opaque and only checked for plausibility when a stored session is restored.

use jiff::Timestamp;
use thiserror::Error;
use tracing::{debug, info, warn};

mod grades;
mod session;
pub mod token;
mod validation;

pub use grades::{Grade, Permission};
pub use session::{
    Activity, MAX_ACTIVITIES, PointEntry, PointKind, Preferences, ProfileUpdate, SocialProvider,
    UserSession,
};
pub use validation::{
    Field, FieldErrors, LoginForm, MIN_NAME_LEN, MIN_PASSWORD_LEN, SignupForm, is_valid_email,
    is_valid_phone,
};

/// Points granted on an email login.
pub const LOGIN_POINTS: u64 = 1_000;

/// Points granted on signup.
pub const SIGNUP_POINTS: u64 = 2_000;

/// Points granted on a social login.
pub const SOCIAL_LOGIN_POINTS: u64 = 1_500;

/// Shortest accepted current password on a password change.
pub const MIN_CURRENT_PASSWORD_LEN: usize = 4;

/// Authentication errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The operation needs a signed-in user
    #[error("not signed in")]
    NotAuthenticated,

    /// Form fields failed validation
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    /// The current password was rejected
    #[error("current password is incorrect")]
    InvalidCurrentPassword,

    /// Not enough points to spend
    #[error("insufficient points: requested {requested}, available {available}")]
    InsufficientPoints {
        /// Points asked for
        requested: u64,

        /// Points held
        available: u64,
    },
}

/// The current session, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auth {
    user: Option<UserSession>,
    token: Option<String>,
}

impl Auth {
    /// Signed-out state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from stored parts. Both parts must be present and the token plausible,
    /// otherwise the result is signed out.
    pub fn restore(user: Option<UserSession>, token: Option<String>) -> Self {
        match (user, token) {
            (Some(user), Some(token)) if token::is_plausible_token(&token) => {
                debug!(user = user.id, "session restored");

                Self {
                    user: Some(user),
                    token: Some(token),
                }
            }
            (None, None) => Self::default(),
            _ => {
                warn!("discarding incomplete stored session");

                Self::default()
            }
        }
    }

    /// Signed-in user.
    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    /// Current token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether someone is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Whether the signed-in user's grade grants a permission. Signed-out users have none.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.grade.allows(permission))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the form is invalid.
    pub fn login(&mut self, form: &LoginForm, now: Timestamp) -> Result<&UserSession, AuthError> {
        form.validate().into_result().map_err(AuthError::Validation)?;

        let name = form
            .email
            .split_once('@')
            .map_or(form.email.as_str(), |(local, _)| local)
            .to_string();

        let user = UserSession::new(form.email.clone(), name, Grade::Regular, LOGIN_POINTS, now);

        Ok(self.start(user, token::issue(now)))
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the form is invalid.
    pub fn signup(&mut self, form: &SignupForm, now: Timestamp) -> Result<&UserSession, AuthError> {
        form.validate().into_result().map_err(AuthError::Validation)?;

        let mut user = UserSession::new(
            form.email.clone(),
            form.name.trim().to_string(),
            Grade::Newcomer,
            SIGNUP_POINTS,
            now,
        );
        user.phone = Some(form.phone.clone());
        user.birth_date = form.birth_date.clone();
        user.preferences.marketing = form.agree_marketing;

        Ok(self.start(user, token::issue(now)))
    }

    /// Sign in through a social provider.
    pub fn social_login(&mut self, provider: SocialProvider, now: Timestamp) -> &UserSession {
        let millis = now.as_millisecond();

        let mut user = UserSession::new(
            format!("user{millis}@{}.com", provider.id()),
            format!("{} user", provider.label()),
            Grade::Regular,
            SOCIAL_LOGIN_POINTS,
            now,
        );
        user.profile_image = Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={millis}"
        ));
        user.provider = Some(provider);

        self.start(user, token::issue_for_provider(provider.id(), now))
    }

    fn start(&mut self, user: UserSession, token: String) -> &UserSession {
        info!(user = user.id, grade = %user.grade, "signed in");

        self.token = Some(token);
        self.user.insert(user)
    }

    /// Sign out. Returns the user that was signed in.
    pub fn logout(&mut self) -> Option<UserSession> {
        self.token = None;

        let user = self.user.take();

        if let Some(user) = &user {
            info!(user = user.id, "signed out");
        }

        user
    }

    fn user_mut(&mut self) -> Result<&mut UserSession, AuthError> {
        self.user.as_mut().ok_or(AuthError::NotAuthenticated)
    }

    /// Change profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session, or
    /// [`AuthError::Validation`] if a new name or phone number is malformed.
    pub fn update_profile(
        &mut self,
        update: ProfileUpdate,
        now: Timestamp,
    ) -> Result<&UserSession, AuthError> {
        let user = self.user_mut()?;

        let mut errors = FieldErrors::default();
        if let Some(name) = &update.name {
            validation::check_name(&mut errors, name);
        }
        if let Some(phone) = &update.phone {
            validation::check_phone(&mut errors, phone);
        }
        errors.into_result().map_err(AuthError::Validation)?;

        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(birth_date) = update.birth_date {
            user.birth_date = Some(birth_date);
        }
        if let Some(image) = update.profile_image {
            user.profile_image = Some(image);
        }
        if let Some(preferences) = update.preferences {
            user.preferences = preferences;
        }
        user.updated_at = Some(now);

        info!(user = user.id, "profile updated");

        Ok(&*user)
    }

    /// Change the password. Nothing is stored; the call only validates.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session,
    /// [`AuthError::InvalidCurrentPassword`] if the current password is too short to be real, or
    /// [`AuthError::Validation`] if the new password is weak.
    pub fn change_password(&mut self, current: &str, new: &str) -> Result<(), AuthError> {
        let user = self.user_mut()?;

        if current.chars().count() < MIN_CURRENT_PASSWORD_LEN {
            return Err(AuthError::InvalidCurrentPassword);
        }

        let mut errors = FieldErrors::default();
        validation::check_password(&mut errors, Field::Password, new);
        errors.into_result().map_err(AuthError::Validation)?;

        info!(user = user.id, "password changed");

        Ok(())
    }

    /// Delete the account and sign out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session.
    pub fn delete_account(&mut self) -> Result<UserSession, AuthError> {
        let user = self.user.take().ok_or(AuthError::NotAuthenticated)?;
        self.token = None;

        info!(user = user.id, "account deleted");

        Ok(user)
    }

    /// Credit points. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session.
    pub fn add_points(
        &mut self,
        amount: u64,
        reason: &str,
        now: Timestamp,
    ) -> Result<u64, AuthError> {
        let user = self.user_mut()?;

        user.points = user.points.saturating_add(amount);
        user.point_history.push(PointEntry {
            amount,
            reason: reason.to_string(),
            date: now,
            kind: PointKind::Earn,
        });

        debug!(user = user.id, amount, balance = user.points, "points added");

        Ok(user.points)
    }

    /// Spend points. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session, or
    /// [`AuthError::InsufficientPoints`] if the balance is too low.
    pub fn use_points(
        &mut self,
        amount: u64,
        reason: &str,
        now: Timestamp,
    ) -> Result<u64, AuthError> {
        let user = self.user_mut()?;

        let Some(balance) = user.points.checked_sub(amount) else {
            return Err(AuthError::InsufficientPoints {
                requested: amount,
                available: user.points,
            });
        };

        user.points = balance;
        user.point_history.push(PointEntry {
            amount,
            reason: reason.to_string(),
            date: now,
            kind: PointKind::Use,
        });

        debug!(user = user.id, amount, balance, "points used");

        Ok(balance)
    }

    /// Move the user to another grade.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session.
    pub fn update_grade(&mut self, grade: Grade, now: Timestamp) -> Result<(), AuthError> {
        let user = self.user_mut()?;

        if user.grade != grade {
            info!(user = user.id, from = %user.grade, to = %grade, "grade changed");
        }

        user.grade = grade;
        user.grade_updated_at = Some(now);

        Ok(())
    }

    /// Record a user action, keeping the most recent [`MAX_ACTIVITIES`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session.
    pub fn track_activity(
        &mut self,
        kind: &str,
        detail: &str,
        now: Timestamp,
    ) -> Result<(), AuthError> {
        self.user_mut()?.record_activity(Activity {
            kind: kind.to_string(),
            detail: detail.to_string(),
            timestamp: now,
        });

        Ok(())
    }

    /// Replace the token with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session.
    pub fn refresh_token(&mut self, now: Timestamp) -> Result<&str, AuthError> {
        if self.user.is_none() {
            return Err(AuthError::NotAuthenticated);
        }

        debug!("token refreshed");

        Ok(self.token.insert(token::issue_refreshed(now)).as_str())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn login_form() -> LoginForm {
        LoginForm::new("kirby@dreamland.kr", "warpstar123")
    }

    fn signup_form() -> SignupForm {
        SignupForm {
            email: "meta@dreamland.kr".to_string(),
            password: "galaxia99".to_string(),
            confirm_password: "galaxia99".to_string(),
            name: " Meta Knight ".to_string(),
            phone: "010-1234-5678".to_string(),
            birth_date: None,
            agree_terms: true,
            agree_privacy: true,
            agree_marketing: false,
        }
    }

    #[test]
    fn login_creates_regular_session() -> TestResult {
        let mut auth = Auth::new();
        let user = auth.login(&login_form(), Timestamp::from_millisecond(1_000)?)?;

        assert_eq!(user.name, "kirby");
        assert_eq!(user.grade, Grade::Regular);
        assert_eq!(user.points, LOGIN_POINTS);
        assert_eq!(user.id, 1_000);
        assert!(auth.token().is_some_and(|t| t.starts_with("token_1000_")));

        Ok(())
    }

    #[test]
    fn login_rejects_invalid_form() {
        let mut auth = Auth::new();
        let result = auth.login(&LoginForm::new("kirby", "short"), Timestamp::UNIX_EPOCH);

        assert!(matches!(
            result,
            Err(AuthError::Validation(errors))
                if errors.get(Field::Email).is_some() && errors.get(Field::Password).is_some()
        ));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn signup_creates_newcomer_with_preferences() -> TestResult {
        let mut auth = Auth::new();
        let user = auth.signup(&signup_form(), Timestamp::UNIX_EPOCH)?;

        assert_eq!(user.name, "Meta Knight");
        assert_eq!(user.grade, Grade::Newcomer);
        assert_eq!(user.points, SIGNUP_POINTS);
        assert!(!user.preferences.marketing);
        assert_eq!(user.phone.as_deref(), Some("010-1234-5678"));

        Ok(())
    }

    #[test]
    fn social_login_uses_provider_token() -> TestResult {
        let mut auth = Auth::new();
        let user = auth.social_login(SocialProvider::Kakao, Timestamp::from_millisecond(42)?);

        assert_eq!(user.email, "user42@kakao.com");
        assert_eq!(user.points, SOCIAL_LOGIN_POINTS);
        assert_eq!(user.provider, Some(SocialProvider::Kakao));
        assert!(auth.token().is_some_and(|t| t.starts_with("kakao_token_42_")));

        Ok(())
    }

    #[test]
    fn restore_requires_user_and_plausible_token() -> TestResult {
        let mut auth = Auth::new();
        auth.login(&login_form(), Timestamp::UNIX_EPOCH)?;
        let user = auth.user().cloned();
        let token = auth.token().map(str::to_string);

        assert!(Auth::restore(user.clone(), token).is_authenticated());
        assert!(!Auth::restore(user.clone(), None).is_authenticated());
        assert!(!Auth::restore(user, Some("short".to_string())).is_authenticated());
        assert!(!Auth::restore(None, Some("token_123456789".to_string())).is_authenticated());

        Ok(())
    }

    #[test]
    fn operations_without_session_fail() {
        let mut auth = Auth::new();
        let now = Timestamp::UNIX_EPOCH;

        assert_eq!(auth.add_points(10, "bonus", now), Err(AuthError::NotAuthenticated));
        assert_eq!(auth.track_activity("view", "", now), Err(AuthError::NotAuthenticated));
        assert_eq!(auth.refresh_token(now).err(), Some(AuthError::NotAuthenticated));
        assert_eq!(auth.delete_account().err(), Some(AuthError::NotAuthenticated));
        assert_eq!(
            auth.change_password("current", "newpassword"),
            Err(AuthError::NotAuthenticated)
        );
    }

    #[test]
    fn points_are_tracked_in_history() -> TestResult {
        let mut auth = Auth::new();
        let now = Timestamp::UNIX_EPOCH;
        auth.login(&login_form(), now)?;

        assert_eq!(auth.add_points(500, "review", now)?, 1_500);
        assert_eq!(auth.use_points(1_200, "order", now)?, 300);
        assert_eq!(
            auth.use_points(400, "order", now),
            Err(AuthError::InsufficientPoints {
                requested: 400,
                available: 300
            })
        );

        let history = auth.user().map(|u| u.point_history.clone()).unwrap_or_default();
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().map(|e| e.kind), Some(PointKind::Use));

        Ok(())
    }

    #[test]
    fn change_password_checks_both_passwords() -> TestResult {
        let mut auth = Auth::new();
        auth.login(&login_form(), Timestamp::UNIX_EPOCH)?;

        assert_eq!(
            auth.change_password("abc", "newpassword"),
            Err(AuthError::InvalidCurrentPassword)
        );
        assert!(matches!(
            auth.change_password("warpstar123", "short"),
            Err(AuthError::Validation(_))
        ));
        assert_eq!(auth.change_password("warpstar123", "newpassword"), Ok(()));

        Ok(())
    }

    #[test]
    fn update_profile_validates_and_applies() -> TestResult {
        let mut auth = Auth::new();
        let now = Timestamp::UNIX_EPOCH;
        auth.login(&login_form(), now)?;

        let bad = ProfileUpdate {
            phone: Some("12345".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(auth.update_profile(bad, now), Err(AuthError::Validation(_))));

        let good = ProfileUpdate {
            name: Some("Pink Puff".to_string()),
            ..ProfileUpdate::default()
        };
        let user = auth.update_profile(good, now)?;

        assert_eq!(user.name, "Pink Puff");
        assert_eq!(user.updated_at, Some(now));

        Ok(())
    }

    #[test]
    fn permissions_follow_grade() -> TestResult {
        let mut auth = Auth::new();
        let now = Timestamp::UNIX_EPOCH;

        assert!(!auth.has_permission(Permission::Basic));

        auth.login(&login_form(), now)?;
        assert!(auth.has_permission(Permission::Basic));
        assert!(!auth.has_permission(Permission::Premium));

        auth.update_grade(Grade::Vip, now)?;
        assert!(auth.has_permission(Permission::Moderator));
        assert!(!auth.has_permission(Permission::Admin));

        Ok(())
    }

    #[test]
    fn refresh_and_logout() -> TestResult {
        let mut auth = Auth::new();
        let now = Timestamp::UNIX_EPOCH;
        auth.login(&login_form(), now)?;

        assert!(auth.refresh_token(now)?.starts_with("refreshed_token_"));
        assert!(auth.logout().is_some());
        assert!(auth.token().is_none());
        assert!(auth.logout().is_none());

        Ok(())
    }
}
