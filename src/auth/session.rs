//! User session records

use std::fmt;

use clap::ValueEnum;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::auth::grades::Grade;

/// Activities kept per user.
pub const MAX_ACTIVITIES: usize = 20;

/// Social login providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    /// Google
    Google,

    /// Kakao
    Kakao,

    /// Naver
    Naver,

    /// Facebook
    Facebook,

    /// Apple
    Apple,
}

impl SocialProvider {
    /// Lowercase provider id.
    pub fn id(self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
            SocialProvider::Kakao => "kakao",
            SocialProvider::Naver => "naver",
            SocialProvider::Facebook => "facebook",
            SocialProvider::Apple => "apple",
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            SocialProvider::Google => "Google",
            SocialProvider::Kakao => "Kakao",
            SocialProvider::Naver => "Naver",
            SocialProvider::Facebook => "Facebook",
            SocialProvider::Apple => "Apple",
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Order and stock notifications
    pub notifications: bool,

    /// Marketing messages
    pub marketing: bool,

    /// Colour theme name
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            marketing: true,
            theme: "pink".to_string(),
        }
    }
}

/// Direction of a points movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    /// Points credited
    Earn,

    /// Points spent
    Use,
}

/// One points movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEntry {
    /// Points moved (always positive)
    pub amount: u64,

    /// Why the points moved
    pub reason: String,

    /// When
    pub date: Timestamp,

    /// Credit or debit
    #[serde(rename = "type")]
    pub kind: PointKind,
}

/// A tracked user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Action name, e.g. `view_product`
    pub kind: String,

    /// Free-form detail
    #[serde(default)]
    pub detail: String,

    /// When
    pub timestamp: Timestamp,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    /// User id (join time in unix millis)
    pub id: i64,

    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Mobile number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Birth date, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    /// Membership grade
    pub grade: Grade,

    /// Points balance
    pub points: u64,

    /// When the account was created
    pub join_date: Timestamp,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    /// Social provider used to sign in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<SocialProvider>,

    /// Preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Points movements, oldest first
    #[serde(default)]
    pub point_history: Vec<PointEntry>,

    /// Most recent activities, oldest first
    #[serde(default)]
    pub activities: Vec<Activity>,

    /// When the grade last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_updated_at: Option<Timestamp>,

    /// When the profile last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl UserSession {
    /// A new session with no history.
    pub fn new(email: String, name: String, grade: Grade, points: u64, now: Timestamp) -> Self {
        Self {
            id: now.as_millisecond(),
            email,
            name,
            phone: None,
            birth_date: None,
            grade,
            points,
            join_date: now,
            profile_image: None,
            provider: None,
            preferences: Preferences::default(),
            point_history: Vec::new(),
            activities: Vec::new(),
            grade_updated_at: None,
            updated_at: None,
        }
    }

    pub(crate) fn record_activity(&mut self, activity: Activity) {
        self.activities.push(activity);

        let excess = self.activities.len().saturating_sub(MAX_ACTIVITIES);
        self.activities.drain(..excess);
    }
}

/// Profile fields a user may change. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name
    pub name: Option<String>,

    /// New mobile number
    pub phone: Option<String>,

    /// New birth date
    pub birth_date: Option<String>,

    /// New avatar URL
    pub profile_image: Option<String>,

    /// New preferences
    pub preferences: Option<Preferences>,
}
