//! Membership grades
//!
//! Loyalty tiers. A grade fixes the member discount, the points earned per order and the
//! cumulative spend needed to reach it.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::pricing::{Price, discount_rate};

/// Membership grade, lowest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Grade {
    /// Freshly signed up
    #[default]
    Newcomer,

    /// Regular member
    Regular,

    /// Excellent member
    Excellent,

    /// VIP member
    Vip,

    /// VVIP member
    Vvip,
}

/// Something a grade may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// VVIP only
    Admin,

    /// VIP and above
    Moderator,

    /// Excellent and above
    Premium,

    /// Regular and above
    Basic,
}

impl Grade {
    /// Every grade, lowest first.
    pub const ALL: [Grade; 5] = [
        Grade::Newcomer,
        Grade::Regular,
        Grade::Excellent,
        Grade::Vip,
        Grade::Vvip,
    ];

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Grade::Newcomer => "Newcomer",
            Grade::Regular => "Regular",
            Grade::Excellent => "Excellent",
            Grade::Vip => "VIP",
            Grade::Vvip => "VVIP",
        }
    }

    /// Member discount in percent points.
    pub fn discount_percent(self) -> u8 {
        match self {
            Grade::Newcomer => 0,
            Grade::Regular => 2,
            Grade::Excellent => 5,
            Grade::Vip => 10,
            Grade::Vvip => 15,
        }
    }

    /// Member discount rate.
    pub fn discount_rate(self) -> Percentage {
        discount_rate(self.discount_percent())
    }

    /// Points earned per order, as a fraction of the goods total.
    pub fn point_rate(self) -> Percentage {
        let tenths = match self {
            Grade::Newcomer => 10,
            Grade::Regular => 12,
            Grade::Excellent => 15,
            Grade::Vip => 20,
            Grade::Vvip => 30,
        };

        // tenths of a percent point
        Percentage::from(Decimal::new(tenths, 3))
    }

    /// Cumulative spend, in minor units, needed to hold the grade.
    pub fn min_purchase(self) -> i64 {
        match self {
            Grade::Newcomer => 0,
            Grade::Regular => 50_000,
            Grade::Excellent => 200_000,
            Grade::Vip => 500_000,
            Grade::Vvip => 1_000_000,
        }
    }

    /// Perks of the grade.
    pub fn benefits(self) -> &'static [&'static str] {
        match self {
            Grade::Newcomer => &["New member deals", "Birthday coupon"],
            Grade::Regular => &["Standard perks", "Member discount"],
            Grade::Excellent => &[
                "Excellent member deals",
                "Free gift wrap",
                "Priority shipping",
            ],
            Grade::Vip => &[
                "VIP events",
                "Personal shopping service",
                "Free shipping on everything",
            ],
            Grade::Vvip => &[
                "VVIP premium perks",
                "Dedicated advisor",
                "Early access to limited editions",
            ],
        }
    }

    /// Highest grade whose minimum spend the total reaches.
    pub fn for_purchase_total(total: &Price) -> Grade {
        let minor = total.to_minor_units();

        Grade::ALL
            .into_iter()
            .rev()
            .find(|grade| minor >= grade.min_purchase())
            .unwrap_or_default()
    }

    /// The grade above this one.
    pub fn next(self) -> Option<Grade> {
        Grade::ALL.into_iter().find(|grade| *grade > self)
    }

    /// Progress from this grade towards the next, 0 to 100 percent. The top grade is always at
    /// 100.
    pub fn progress(self, total: &Price) -> u8 {
        let Some(next) = self.next() else {
            return 100;
        };

        let floor = self.min_purchase();
        let span = Decimal::from(next.min_purchase() - floor);
        let done = Decimal::from(total.to_minor_units() - floor);

        (done * Decimal::ONE_HUNDRED / span)
            .floor()
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .to_u8()
            .unwrap_or_default()
    }

    /// Whether the grade grants a permission.
    pub fn allows(self, permission: Permission) -> bool {
        match permission {
            Permission::Admin => self == Grade::Vvip,
            Permission::Moderator => self >= Grade::Vip,
            Permission::Premium => self >= Grade::Excellent,
            Permission::Basic => self >= Grade::Regular,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::KRW};

    use super::*;

    fn krw(amount: i64) -> Price {
        Money::from_minor(amount, KRW)
    }

    #[test]
    fn grade_for_purchase_total_uses_thresholds() {
        assert_eq!(Grade::for_purchase_total(&krw(0)), Grade::Newcomer);
        assert_eq!(Grade::for_purchase_total(&krw(49_999)), Grade::Newcomer);
        assert_eq!(Grade::for_purchase_total(&krw(50_000)), Grade::Regular);
        assert_eq!(Grade::for_purchase_total(&krw(750_000)), Grade::Vip);
        assert_eq!(Grade::for_purchase_total(&krw(5_000_000)), Grade::Vvip);
    }

    #[test]
    fn next_walks_up_and_stops_at_top() {
        assert_eq!(Grade::Newcomer.next(), Some(Grade::Regular));
        assert_eq!(Grade::Vip.next(), Some(Grade::Vvip));
        assert_eq!(Grade::Vvip.next(), None);
    }

    #[test]
    fn progress_is_clamped_percentage() {
        assert_eq!(Grade::Regular.progress(&krw(125_000)), 50);
        assert_eq!(Grade::Regular.progress(&krw(10_000)), 0);
        assert_eq!(Grade::Regular.progress(&krw(900_000)), 100);
        assert_eq!(Grade::Vvip.progress(&krw(0)), 100);
    }

    #[test]
    fn point_rate_is_fraction_of_total() {
        let total = Decimal::from(10_000);

        assert_eq!(Grade::Regular.point_rate() * total, Decimal::from(120));
        assert_eq!(Grade::Vvip.point_rate() * total, Decimal::from(300));
    }

    #[test]
    fn permissions_follow_grade_order() {
        assert!(Grade::Vvip.allows(Permission::Admin));
        assert!(!Grade::Vip.allows(Permission::Admin));
        assert!(Grade::Vip.allows(Permission::Moderator));
        assert!(Grade::Excellent.allows(Permission::Premium));
        assert!(Grade::Regular.allows(Permission::Basic));
        assert!(!Grade::Newcomer.allows(Permission::Basic));
    }
}
