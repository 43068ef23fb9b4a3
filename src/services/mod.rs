//! Business logic services

pub mod auth;
pub mod catalog;
pub mod email;
pub mod loans;
pub mod reminders;
pub mod reports;
pub mod reservations;
pub mod stats;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, CirculationConfig, EmailConfig},
    repository::Repository,
};

/// Container for the services behind the HTTP API.
///
/// The notification sweeps ([`reminders::RemindersService`]) are not part of
/// this container; the cron-driven `reminders` binary wires them up itself.
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub reservations: reservations::ReservationsService,
    pub stats: stats::StatsService,
    pub reports: reports::ReportsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        circulation: CirculationConfig,
        email_config: EmailConfig,
    ) -> Self {
        let notifier: Arc<dyn email::Notifier> = Arc::new(email::EmailService::new(email_config));

        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), notifier, circulation.clone()),
            reservations: reservations::ReservationsService::new(repository.clone(), circulation),
            stats: stats::StatsService::new(repository.clone()),
            reports: reports::ReportsService::new(repository),
        }
    }
}
