use chrono::{NaiveDateTime, Timelike};

use crate::models::{Appointment, AppointmentError};

/// A slot starts exactly on the hour.
pub fn is_on_the_hour(date_time: &NaiveDateTime) -> bool {
    date_time.minute() == 0 && date_time.second() == 0 && date_time.nanosecond() == 0
}

pub fn ensure_on_the_hour(date_time: NaiveDateTime) -> Result<(), AppointmentError> {
    if is_on_the_hour(&date_time) {
        Ok(())
    } else {
        Err(AppointmentError::InvalidSlot(date_time))
    }
}

/// Fails when `existing` holds the doctor's slot, unless it is the appointment
/// identified by `owner`.
pub fn ensure_slot_free(
    existing: Option<&Appointment>,
    doctor_id: i64,
    date_time: NaiveDateTime,
    owner: Option<i64>,
) -> Result<(), AppointmentError> {
    match existing {
        Some(holder) if Some(holder.id) != owner => Err(AppointmentError::SlotConflict { doctor_id, date_time }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_every_off_hour_time_is_rejected() {
        for minute in 0..60 {
            for second in 0..60 {
                let dt = at(9, minute, second);
                let aligned = minute == 0 && second == 0;
                assert_eq!(ensure_on_the_hour(dt).is_ok(), aligned, "{}", dt);
            }
        }
    }

    #[test]
    fn test_sub_second_offsets_are_rejected() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(9, 0, 0, 500)
            .unwrap();
        assert_matches!(ensure_on_the_hour(dt), Err(AppointmentError::InvalidSlot(_)));
    }

    #[test]
    fn test_slot_held_by_another_appointment_conflicts() {
        let holder = Appointment { id: 1, doctor_id: 1, animal_id: 2, appointment_date_time: at(9, 0, 0) };

        assert!(ensure_slot_free(None, 1, at(9, 0, 0), None).is_ok());
        assert_matches!(
            ensure_slot_free(Some(&holder), 1, at(9, 0, 0), None),
            Err(AppointmentError::SlotConflict { doctor_id: 1, .. })
        );
        // An appointment does not conflict with itself
        assert!(ensure_slot_free(Some(&holder), 1, at(9, 0, 0), Some(1)).is_ok());
        assert!(ensure_slot_free(Some(&holder), 1, at(9, 0, 0), Some(2)).is_err());
    }
}
