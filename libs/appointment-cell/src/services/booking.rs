// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use doctor_cell::services::{DoctorRegistry, PresenceService};

use crate::error::BookingError;
use crate::models::{
    AssignmentRecord, AssignmentStrategy, BookingOutcome, BookingRequest, DoctorChoice,
    DoctorLoad,
};
use crate::services::assignment::{choose_strategy, least_loaded, SessionCounters};
use crate::services::store::PatientStore;

/// Owns the per-process booking state. Created once at startup and shared
/// by every request.
pub struct BookingService {
    presence: Arc<PresenceService>,
    store: Arc<dyn PatientStore>,
    // Held for the whole assign-and-append step so bookings never interleave.
    session: Mutex<SessionCounters>,
}

impl BookingService {
    pub fn new(presence: Arc<PresenceService>, store: Arc<dyn PatientStore>) -> Self {
        let session = SessionCounters::new(presence.registry().ids());

        Self {
            presence,
            store,
            session: Mutex::new(session),
        }
    }

    pub fn with_session_counters(mut self, counters: SessionCounters) -> Self {
        self.session = Mutex::new(counters);
        self
    }

    pub fn registry(&self) -> &DoctorRegistry {
        self.presence.registry()
    }

    #[instrument(skip_all)]
    pub async fn book(
        &self,
        request: BookingRequest,
        choice: DoctorChoice,
    ) -> Result<BookingOutcome, BookingError> {
        match choice {
            DoctorChoice::Specific(doctor_id) => self.book_with(request, doctor_id).await,
            DoctorChoice::Auto => self.auto_assign(request).await,
        }
    }

    /// Books straight onto the named doctor. Session counters are left alone.
    async fn book_with(
        &self,
        request: BookingRequest,
        doctor_id: String,
    ) -> Result<BookingOutcome, BookingError> {
        if !self.registry().contains(&doctor_id) {
            return Err(BookingError::UnknownDoctor(doctor_id));
        }

        let _session = self.session.lock().await;
        let record = AssignmentRecord::new(request, &doctor_id);
        self.store.append(&record).await?;

        info!("Booked requested doctor {}", doctor_id);
        Ok(BookingOutcome {
            doctor_id,
            strategy: None,
            record,
        })
    }

    pub async fn auto_assign(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        let available = self.presence.available_doctors().await;
        let strategy = choose_strategy(&available);
        debug!("Available doctors {:?}, using {:?} strategy", available, strategy);

        let mut session = self.session.lock().await;

        let selected = match strategy {
            AssignmentStrategy::Local => session.select_local().map(str::to_string),
            AssignmentStrategy::Overall => self.select_overall().await?,
        };
        let doctor_id = selected.ok_or_else(|| {
            warn!("No doctor could be selected");
            BookingError::NoDoctorAvailable
        })?;

        let record = AssignmentRecord::new(request, &doctor_id);
        self.store.append(&record).await?;

        // Only count the patient once the record is on disk.
        if strategy == AssignmentStrategy::Local {
            session.increment(&doctor_id);
        }

        info!("Assigned patient to {} via {:?} strategy", doctor_id, strategy);
        Ok(BookingOutcome {
            doctor_id,
            strategy: Some(strategy),
            record,
        })
    }

    /// Doctor with the fewest persisted records at call time.
    pub async fn select_overall(&self) -> Result<Option<String>, BookingError> {
        let mut loads = Vec::with_capacity(self.registry().len());
        for doctor_id in self.registry().ids() {
            loads.push((doctor_id, self.store.count(doctor_id).await?));
        }

        Ok(least_loaded(loads).map(str::to_string))
    }

    pub async fn session_counters(&self) -> SessionCounters {
        self.session.lock().await.clone()
    }

    pub async fn load(&self) -> Result<Vec<DoctorLoad>, BookingError> {
        let session = self.session_counters().await;

        let mut loads = Vec::with_capacity(self.registry().len());
        for doctor_id in self.registry().ids() {
            loads.push(DoctorLoad {
                doctor_id: doctor_id.to_string(),
                session_count: session.get(doctor_id),
                persisted_count: self.store.count(doctor_id).await?,
            });
        }

        Ok(loads)
    }

    pub async fn records(&self, doctor_id: &str) -> Result<Vec<AssignmentRecord>, BookingError> {
        if !self.registry().contains(doctor_id) {
            return Err(BookingError::UnknownDoctor(doctor_id.to_string()));
        }

        self.store.records(doctor_id).await
    }
}
