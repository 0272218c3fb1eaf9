use crate::seating::{Fragment, Seat};
use boxoffice_shared::Masked;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Process-unique hold identifier, assigned by the pool and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(pub u64);

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hold lifecycle. Expired holds are not a state: the pool drops them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldStatus {
    Held,
    Confirmed,
}

/// A time-boxed claim on a set of fragments. Once confirmed it becomes a reservation and never expires.
#[derive(Debug, Clone)]
pub struct Hold {
    id: HoldId,
    fragments: Vec<Fragment>,
    owner_email: Masked<String>,
    created_at: DateTime<Utc>,
    hold_minutes: u32,
    confirmation_code: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl Hold {
    pub fn new(
        id: HoldId,
        fragments: Vec<Fragment>,
        owner_email: impl Into<String>,
        created_at: DateTime<Utc>,
        hold_minutes: u32,
    ) -> Self {
        Self {
            id,
            fragments,
            owner_email: Masked(owner_email.into()),
            created_at,
            hold_minutes,
            confirmation_code: None,
            confirmed_at: None,
        }
    }

    pub fn id(&self) -> HoldId {
        self.id
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Give up the claimed fragments, e.g. to return them to the pool on expiry
    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    pub fn owner_email(&self) -> &Masked<String> {
        &self.owner_email
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner_email.inner() == email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn hold_minutes(&self) -> u32 {
        self.hold_minutes
    }

    pub fn confirmation_code(&self) -> Option<&str> {
        self.confirmation_code.as_deref()
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn status(&self) -> HoldStatus {
        if self.confirmation_code.is_some() {
            HoldStatus::Confirmed
        } else {
            HoldStatus::Held
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status() == HoldStatus::Confirmed
    }

    /// End of the hold window. Irrelevant once confirmed.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(i64::from(self.hold_minutes))
    }

    /// Confirmed holds are always valid; unconfirmed ones until `expires_at` (exclusive).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_confirmed() || now < self.expires_at()
    }

    pub fn seat_count(&self) -> u32 {
        self.fragments.iter().map(Fragment::size).sum()
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.fragments.iter().flat_map(|f| f.seats().iter())
    }

    pub fn total_cost(&self) -> f64 {
        self.fragments.iter().map(Fragment::total_cost).sum()
    }

    /// HELD → CONFIRMED. Stamps the confirmation time and issues a fresh confirmation code.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<String, HoldError> {
        if self.is_confirmed() {
            return Err(HoldError::AlreadyConfirmed(self.id));
        }
        if !self.is_valid(now) {
            return Err(HoldError::Expired(self.id));
        }

        let code = Uuid::new_v4().to_string();
        self.confirmation_code = Some(code.clone());
        self.confirmed_at = Some(now);
        Ok(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HoldError {
    #[error("Hold {0} has expired")]
    Expired(HoldId),

    #[error("Hold {0} is already confirmed")]
    AlreadyConfirmed(HoldId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold(minutes: u32, created_at: DateTime<Utc>) -> Hold {
        let fragment = Fragment::new(vec![Seat::new(0, 2, 1.0), Seat::new(0, 3, 0.5)]).unwrap();
        Hold::new(HoldId(1), vec![fragment], "name@domain.com", created_at, minutes)
    }

    #[test]
    fn test_new_hold_is_held() {
        let now = Utc::now();
        let hold = hold(2, now);
        assert_eq!(hold.status(), HoldStatus::Held);
        assert_eq!(hold.seat_count(), 2);
        assert!((hold.total_cost() - 1.5).abs() < 0.00001);
        assert_eq!(hold.seats().count(), 2);
        assert_eq!(hold.expires_at(), now + Duration::minutes(2));
        assert!(hold.is_owned_by("name@domain.com"));
        assert!(!hold.is_owned_by("other@domain.com"));
        assert!(hold.confirmation_code().is_none());
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let hold = hold(10, now);
        assert!(hold.is_valid(now));
        assert!(hold.is_valid(now + Duration::minutes(9)));
        assert!(!hold.is_valid(now + Duration::minutes(10)));
    }

    #[test]
    fn test_zero_minute_hold_is_immediately_invalid() {
        let now = Utc::now();
        assert!(!hold(0, now).is_valid(now));
    }

    #[test]
    fn test_confirm_once() {
        let now = Utc::now();
        let mut hold = hold(10, now);

        let code = hold.confirm(now + Duration::minutes(1)).unwrap();
        assert_eq!(hold.status(), HoldStatus::Confirmed);
        assert_eq!(hold.confirmation_code(), Some(code.as_str()));
        assert_eq!(hold.confirmed_at(), Some(now + Duration::minutes(1)));

        assert_eq!(
            hold.confirm(now + Duration::minutes(2)),
            Err(HoldError::AlreadyConfirmed(HoldId(1)))
        );
        // the first code survives the failed second attempt
        assert_eq!(hold.confirmation_code(), Some(code.as_str()));
    }

    #[test]
    fn test_confirmed_hold_never_expires() {
        let now = Utc::now();
        let mut hold = hold(1, now);
        hold.confirm(now).unwrap();
        assert!(hold.is_valid(now + Duration::days(365)));
    }

    #[test]
    fn test_confirm_after_window_fails() {
        let now = Utc::now();
        let mut hold = hold(1, now);
        assert_eq!(
            hold.confirm(now + Duration::minutes(1)),
            Err(HoldError::Expired(HoldId(1)))
        );
        assert_eq!(hold.status(), HoldStatus::Held);
    }

    #[test]
    fn test_owner_email_is_masked_in_debug() {
        let hold = hold(1, Utc::now());
        let debug = format!("{:?}", hold);
        assert!(!debug.contains("name@domain.com"));
    }
}
