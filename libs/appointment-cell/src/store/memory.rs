use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Appointment, NewAppointment, PageRequest, RangeFilter};
use crate::store::{AppointmentStore, Reference, StoreError};

/// Process-local store used for development and tests.
///
/// All writes run under one write lock, so the slot index check and the
/// insert are a single atomic step.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    appointments: BTreeMap<i64, Appointment>,
    slots: HashMap<(i64, NaiveDateTime), i64>,
    known: Option<KnownReferences>,
}

#[derive(Debug, Default, Clone)]
struct KnownReferences {
    doctors: HashSet<i64>,
    animals: HashSet<i64>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects appointments for doctors or animals outside the
    /// given sets, the way foreign keys do on the relational backend.
    pub fn with_known_references(
        doctors: impl IntoIterator<Item = i64>,
        animals: impl IntoIterator<Item = i64>,
    ) -> Self {
        let known = KnownReferences {
            doctors: doctors.into_iter().collect(),
            animals: animals.into_iter().collect(),
        };
        Self {
            inner: RwLock::new(Inner {
                known: Some(known),
                ..Inner::default()
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.appointments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Inner {
    fn check_references(&self, doctor_id: i64, animal_id: i64) -> Result<(), StoreError> {
        let Some(known) = &self.known else {
            return Ok(());
        };
        if !known.doctors.contains(&doctor_id) {
            return Err(StoreError::MissingReference(Reference::Doctor(doctor_id)));
        }
        if !known.animals.contains(&animal_id) {
            return Err(StoreError::MissingReference(Reference::Animal(animal_id)));
        }
        Ok(())
    }

    fn check_slot(&self, doctor_id: i64, date_time: NaiveDateTime, owner: Option<i64>) -> Result<(), StoreError> {
        match self.slots.get(&(doctor_id, date_time)) {
            Some(holder) if Some(*holder) != owner => Err(StoreError::Conflict { doctor_id, date_time }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_references(new.doctor_id, new.animal_id)?;
        inner.check_slot(new.doctor_id, new.appointment_date_time, None)?;

        inner.next_id += 1;
        let appointment = Appointment::from_new(inner.next_id, new);
        inner
            .slots
            .insert((appointment.doctor_id, appointment.appointment_date_time), appointment.id);
        inner.appointments.insert(appointment.id, appointment.clone());

        debug!("Stored appointment {} in memory", appointment.id);
        Ok(appointment)
    }

    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.appointments.get(&appointment.id).cloned() else {
            return Ok(None);
        };

        inner.check_references(appointment.doctor_id, appointment.animal_id)?;
        inner.check_slot(appointment.doctor_id, appointment.appointment_date_time, Some(appointment.id))?;

        inner.slots.remove(&(current.doctor_id, current.appointment_date_time));
        inner
            .slots
            .insert((appointment.doctor_id, appointment.appointment_date_time), appointment.id);
        inner.appointments.insert(appointment.id, appointment.clone());

        Ok(Some(appointment))
    }

    async fn get(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        Ok(self.inner.read().await.appointments.get(&id).cloned())
    }

    async fn find_by_doctor_at(
        &self,
        doctor_id: i64,
        date_time: NaiveDateTime,
    ) -> Result<Option<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .slots
            .get(&(doctor_id, date_time))
            .and_then(|id| inner.appointments.get(id))
            .cloned())
    }

    async fn find_in_range(&self, filter: RangeFilter) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matches.sort_by_key(|a| (a.appointment_date_time, a.id));
        Ok(matches)
    }

    async fn page(&self, request: PageRequest) -> Result<(Vec<Appointment>, u64), StoreError> {
        let inner = self.inner.read().await;
        let total = inner.appointments.len() as u64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = inner
            .appointments
            .values()
            .skip(skip)
            .take(request.page_size as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.appointments.remove(&id) {
            Some(removed) => {
                inner.slots.remove(&(removed.doctor_id, removed.appointment_date_time));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
