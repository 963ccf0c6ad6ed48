//! crates/nearserve_core/src/domain/availability.rs
//!
//! The provider availability overlay: weekly recurring slots, one-off
//! holidays, and one-off breaks. The three collections are independent;
//! bookability at a concrete instant is derived by [`AvailabilityOverlay::is_bookable_at`].

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::{parse_date, parse_hhmm};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("'{0}' is not a valid HH:MM time")]
    InvalidTime(String),
    #[error("'{0}' is not a valid YYYY-MM-DD date")]
    InvalidDate(String),
    #[error("Holiday already exists for this date")]
    DuplicateHoliday,
}

/// Weekdays as stored on the wire (lowercase names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// A bookable window within a weekday. Times are `HH:MM` 24-hour strings,
/// validated on construction. Whether `start < end` is deliberately not
/// checked here; a backwards slot simply never contains any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: &str, end: &str) -> Result<Self, AvailabilityError> {
        validate_hhmm(start)?;
        validate_hhmm(end)?;
        Ok(Self {
            id: Uuid::new_v4(),
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    fn contains(&self, time: NaiveTime) -> bool {
        match (parse_hhmm(&self.start), parse_hhmm(&self.end)) {
            (Some(start), Some(end)) => start <= time && time < end,
            _ => false,
        }
    }
}

/// Slots for one weekday. Entries exist only while they hold at least one
/// slot; the weekday entry is dropped with its last slot and re-created
/// lazily on the next add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub day: Weekday,
    pub slots: Vec<TimeSlot>,
}

/// A full-day closure. At most one per date per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: Uuid,
    pub date: String,
    pub reason: String,
}

/// A within-day closure window. Unlike holidays, breaks on the same date
/// may pile up freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    pub id: Uuid,
    pub date: String,
    pub start: String,
    pub end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Break {
    fn covers(&self, date: NaiveDate, time: NaiveTime) -> bool {
        if parse_date(&self.date) != Some(date) {
            return false;
        }
        match (parse_hhmm(&self.start), parse_hhmm(&self.end)) {
            (Some(start), Some(end)) => start <= time && time < end,
            _ => false,
        }
    }
}

/// Everything that determines when a provider can be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOverlay {
    #[serde(rename = "isAvailable")]
    pub is_available: bool,
    #[serde(rename = "weeklyAvailability")]
    pub weekly: Vec<DayAvailability>,
    pub holidays: Vec<Holiday>,
    pub breaks: Vec<Break>,
}

impl Default for AvailabilityOverlay {
    fn default() -> Self {
        Self {
            is_available: true,
            weekly: Vec::new(),
            holidays: Vec::new(),
            breaks: Vec::new(),
        }
    }
}

impl AvailabilityOverlay {
    /// Appends a slot to the given weekday, creating the weekday entry on
    /// demand. Returns the new slot's id.
    pub fn add_slot(
        &mut self,
        day: Weekday,
        start: &str,
        end: &str,
    ) -> Result<Uuid, AvailabilityError> {
        let slot = TimeSlot::new(start, end)?;
        let slot_id = slot.id;
        match self.weekly.iter_mut().find(|entry| entry.day == day) {
            Some(entry) => entry.slots.push(slot),
            None => self.weekly.push(DayAvailability { day, slots: vec![slot] }),
        }
        Ok(slot_id)
    }

    /// Replaces the whole weekly grid. Incoming slot times get the same
    /// `HH:MM` validation [`Self::add_slot`] applies, and day entries with
    /// no slots are dropped instead of stored empty. On error the existing
    /// grid is left untouched.
    pub fn replace_weekly(
        &mut self,
        weekly: Vec<DayAvailability>,
    ) -> Result<(), AvailabilityError> {
        for entry in &weekly {
            for slot in &entry.slots {
                validate_hhmm(&slot.start)?;
                validate_hhmm(&slot.end)?;
            }
        }
        self.weekly = weekly;
        self.weekly.retain(|entry| !entry.slots.is_empty());
        Ok(())
    }

    /// Removes a slot from the given weekday. When the day's slot list
    /// becomes empty the day entry itself is removed. Unknown ids are a
    /// no-op, matching delete-idempotence elsewhere.
    pub fn remove_slot(&mut self, day: Weekday, slot_id: Uuid) {
        if let Some(entry) = self.weekly.iter_mut().find(|entry| entry.day == day) {
            entry.slots.retain(|slot| slot.id != slot_id);
        }
        self.weekly.retain(|entry| entry.day != day || !entry.slots.is_empty());
    }

    /// Adds a holiday. Duplicate dates are a hard reject, never a merge.
    pub fn add_holiday(&mut self, date: &str, reason: &str) -> Result<Uuid, AvailabilityError> {
        if parse_date(date).is_none() {
            return Err(AvailabilityError::InvalidDate(date.to_string()));
        }
        if self.holidays.iter().any(|holiday| holiday.date == date) {
            return Err(AvailabilityError::DuplicateHoliday);
        }
        let holiday = Holiday {
            id: Uuid::new_v4(),
            date: date.to_string(),
            reason: reason.to_string(),
        };
        let id = holiday.id;
        self.holidays.push(holiday);
        Ok(id)
    }

    pub fn remove_holiday(&mut self, holiday_id: Uuid) {
        self.holidays.retain(|holiday| holiday.id != holiday_id);
    }

    /// Adds a break. Breaks are not deduplicated.
    pub fn add_break(
        &mut self,
        date: &str,
        start: &str,
        end: &str,
        reason: Option<String>,
    ) -> Result<Uuid, AvailabilityError> {
        if parse_date(date).is_none() {
            return Err(AvailabilityError::InvalidDate(date.to_string()));
        }
        validate_hhmm(start)?;
        validate_hhmm(end)?;
        let brk = Break {
            id: Uuid::new_v4(),
            date: date.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            reason,
        };
        let id = brk.id;
        self.breaks.push(brk);
        Ok(id)
    }

    pub fn remove_break(&mut self, break_id: Uuid) {
        self.breaks.retain(|brk| brk.id != break_id);
    }

    /// The derived bookability query: the provider is bookable at a concrete
    /// instant when the overall flag is up, some weekly slot for that weekday
    /// contains the time, the date is not a holiday, and no break covers the
    /// instant.
    pub fn is_bookable_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        if !self.is_available {
            return false;
        }
        let weekday = Weekday::from(date.weekday());
        let in_slot = self
            .weekly
            .iter()
            .filter(|entry| entry.day == weekday)
            .flat_map(|entry| entry.slots.iter())
            .any(|slot| slot.contains(time));
        if !in_slot {
            return false;
        }
        if self.holidays.iter().any(|holiday| parse_date(&holiday.date) == Some(date)) {
            return false;
        }
        !self.breaks.iter().any(|brk| brk.covers(date, time))
    }
}

fn validate_hhmm(value: &str) -> Result<(), AvailabilityError> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| AvailabilityError::InvalidTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        // 2025-06-02 is a Monday.
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn add_slot_creates_day_entry_on_demand() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_slot(Weekday::Monday, "09:00", "12:00").unwrap();
        overlay.add_slot(Weekday::Monday, "13:00", "17:00").unwrap();
        assert_eq!(overlay.weekly.len(), 1);
        assert_eq!(overlay.weekly[0].slots.len(), 2);
    }

    #[test]
    fn removing_last_slot_drops_the_day_entry() {
        let mut overlay = AvailabilityOverlay::default();
        let slot_id = overlay.add_slot(Weekday::Friday, "09:00", "12:00").unwrap();
        overlay.remove_slot(Weekday::Friday, slot_id);
        assert!(overlay.weekly.is_empty());

        // Re-adding recreates the entry.
        overlay.add_slot(Weekday::Friday, "10:00", "11:00").unwrap();
        assert_eq!(overlay.weekly.len(), 1);
    }

    #[test]
    fn removing_one_of_two_slots_keeps_the_day() {
        let mut overlay = AvailabilityOverlay::default();
        let first = overlay.add_slot(Weekday::Monday, "09:00", "12:00").unwrap();
        overlay.add_slot(Weekday::Monday, "13:00", "17:00").unwrap();
        overlay.remove_slot(Weekday::Monday, first);
        assert_eq!(overlay.weekly.len(), 1);
        assert_eq!(overlay.weekly[0].slots.len(), 1);
    }

    #[test]
    fn slot_times_must_be_hhmm() {
        let mut overlay = AvailabilityOverlay::default();
        assert_eq!(
            overlay.add_slot(Weekday::Monday, "9am", "12:00"),
            Err(AvailabilityError::InvalidTime("9am".to_string()))
        );
        assert!(overlay.weekly.is_empty());
    }

    #[test]
    fn replacing_the_week_validates_slot_times() {
        let mut overlay = AvailabilityOverlay::default();
        let weekly: Vec<DayAvailability> = serde_json::from_str(
            r#"[{"day":"monday","slots":[{"start":"9am","end":"noon"}]}]"#,
        )
        .unwrap();
        assert_eq!(
            overlay.replace_weekly(weekly),
            Err(AvailabilityError::InvalidTime("9am".to_string()))
        );
        assert!(overlay.weekly.is_empty());
    }

    #[test]
    fn replacement_slots_get_generated_ids() {
        // Clients post replacement slots without ids.
        let mut overlay = AvailabilityOverlay::default();
        let weekly: Vec<DayAvailability> = serde_json::from_str(
            r#"[{"day":"monday","slots":[{"start":"09:00","end":"12:00"}]},
                {"day":"tuesday","slots":[]}]"#,
        )
        .unwrap();
        overlay.replace_weekly(weekly).unwrap();
        assert_eq!(overlay.weekly.len(), 1, "empty day entries are dropped");
        assert!(!overlay.weekly[0].slots[0].id.is_nil());
    }

    #[test]
    fn duplicate_holiday_date_is_rejected() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_holiday("2025-12-25", "Christmas").unwrap();
        assert_eq!(
            overlay.add_holiday("2025-12-25", "Also Christmas"),
            Err(AvailabilityError::DuplicateHoliday)
        );
        assert_eq!(overlay.holidays.len(), 1);
    }

    #[test]
    fn breaks_on_the_same_date_are_allowed() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_break("2025-06-02", "12:00", "13:00", None).unwrap();
        overlay
            .add_break("2025-06-02", "12:00", "13:00", Some("double lunch".into()))
            .unwrap();
        assert_eq!(overlay.breaks.len(), 2);
    }

    #[test]
    fn bookable_requires_a_containing_slot() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_slot(Weekday::Monday, "09:00", "12:00").unwrap();
        assert!(overlay.is_bookable_at(monday(), at(10, 30)));
        assert!(!overlay.is_bookable_at(monday(), at(12, 0)), "end is exclusive");
        assert!(!overlay.is_bookable_at(monday(), at(8, 59)));
        // Tuesday has no slots at all.
        assert!(!overlay.is_bookable_at(monday().succ_opt().unwrap(), at(10, 30)));
    }

    #[test]
    fn holiday_excludes_the_whole_day() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_slot(Weekday::Monday, "09:00", "17:00").unwrap();
        overlay.add_holiday("2025-06-02", "inventory").unwrap();
        assert!(!overlay.is_bookable_at(monday(), at(10, 0)));
    }

    #[test]
    fn break_excludes_only_its_window() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_slot(Weekday::Monday, "09:00", "17:00").unwrap();
        overlay.add_break("2025-06-02", "12:00", "13:00", None).unwrap();
        assert!(!overlay.is_bookable_at(monday(), at(12, 30)));
        assert!(overlay.is_bookable_at(monday(), at(13, 0)));
        assert!(overlay.is_bookable_at(monday(), at(11, 59)));
    }

    #[test]
    fn master_switch_overrides_everything() {
        let mut overlay = AvailabilityOverlay::default();
        overlay.add_slot(Weekday::Monday, "09:00", "17:00").unwrap();
        overlay.is_available = false;
        assert!(!overlay.is_bookable_at(monday(), at(10, 0)));
    }
}
