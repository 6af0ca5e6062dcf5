//! Application wiring: one `AppContext` owning every service, and the
//! `Navigator` that decides which page is shown and what gets reloaded.

use crate::config::AppConfig;
use crate::domains::activity::ActivityService;
use crate::domains::beneficiary::BeneficiaryService;
use crate::domains::core::feedback::{messages, NotificationQueue, Notifier};
use crate::domains::core::manager::ChangeEvent;
use crate::domains::core::repository::RepositoryClient;
use crate::domains::core::rest_client::RestRepositoryClient;
use crate::domains::dashboard::DashboardService;
use crate::domains::indicator::IndicatorService;
use crate::domains::map::MapService;
use crate::domains::project::ProjectService;
use crate::domains::report::ReportService;
use crate::errors::{ServiceError, ServiceResult};
use chrono::{DateTime, Local, NaiveDate, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Set a default `RUST_LOG` and start `env_logger`. Safe to call twice.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = env_logger::try_init();
}

/// Pages of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Projects,
    Activities,
    Beneficiaries,
    Indicators,
    Map,
    Reports,
    Settings,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Dashboard,
        Page::Projects,
        Page::Activities,
        Page::Beneficiaries,
        Page::Indicators,
        Page::Map,
        Page::Reports,
        Page::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Projects => "projects",
            Page::Activities => "activities",
            Page::Beneficiaries => "beneficiaries",
            Page::Indicators => "indicators",
            Page::Map => "map",
            Page::Reports => "reports",
            Page::Settings => "settings",
        }
    }

    /// Unknown names fall back to the dashboard
    pub fn from_name(name: &str) -> Page {
        Page::ALL
            .iter()
            .copied()
            .find(|page| page.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(Page::Dashboard)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Projects => "Projects",
            Page::Activities => "Activities",
            Page::Beneficiaries => "Beneficiaries",
            Page::Indicators => "Indicators",
            Page::Map => "Map",
            Page::Reports => "Reports",
            Page::Settings => "Settings",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every service of the console, built once from the configuration
pub struct AppContext {
    pub config: AppConfig,
    pub repository: Arc<dyn RepositoryClient>,
    pub notifications: Arc<NotificationQueue>,
    pub events: broadcast::Sender<ChangeEvent>,
    pub projects: ProjectService,
    pub activities: ActivityService,
    pub beneficiaries: BeneficiaryService,
    pub indicators: IndicatorService,
    pub map: MapService,
    pub reports: ReportService,
    pub dashboard: DashboardService,
}

impl AppContext {
    /// Context over the configured REST API
    pub fn new(config: AppConfig) -> Self {
        let repository: Arc<dyn RepositoryClient> = Arc::new(RestRepositoryClient::new(&config.api));
        Self::with_repository(config, repository)
    }

    pub fn with_repository(config: AppConfig, repository: Arc<dyn RepositoryClient>) -> Self {
        let notifications = Arc::new(NotificationQueue::new());
        let notifier: Arc<dyn Notifier> = notifications.clone();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let currency = config.report.currency.clone();

        Self {
            projects: ProjectService::new(repository.clone(), notifier.clone(), events.clone(), &currency),
            activities: ActivityService::new(repository.clone(), notifier.clone(), events.clone()),
            beneficiaries: BeneficiaryService::new(repository.clone(), notifier.clone(), events.clone()),
            indicators: IndicatorService::new(repository.clone(), notifier.clone(), events.clone()),
            map: MapService::new(repository.clone(), notifier.clone(), &config.map),
            reports: ReportService::new(repository.clone(), notifier.clone(), config.report.clone()),
            dashboard: DashboardService::new(repository.clone(), notifier, &currency),
            config,
            repository,
            notifications,
            events,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifications.clone()
    }
}

/// Tracks the active page and keeps dependent views fresh
pub struct Navigator {
    context: AppContext,
    current: Page,
    changes: broadcast::Receiver<ChangeEvent>,
    last_sync: Option<DateTime<Utc>>,
}

impl Navigator {
    pub fn new(context: AppContext) -> Self {
        let changes = context.events.subscribe();
        let current = if context.is_configured() {
            Page::Dashboard
        } else {
            Page::Settings
        };
        Self {
            context,
            current,
            changes,
            last_sync: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.context
    }

    pub fn current(&self) -> Page {
        self.current
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Switch to `page` and reload its data. Without a valid configuration
    /// every navigation lands on the settings page.
    pub async fn navigate(&mut self, page: Page) -> ServiceResult<Page> {
        if !self.context.is_configured() {
            if page != Page::Settings {
                self.context.notifications.error(messages::MISSING_CONFIGURATION);
            }
            self.current = Page::Settings;
            return Ok(Page::Settings);
        }

        debug!("Navigating to {}", page);
        self.current = page;
        self.reload(page).await?;
        Ok(page)
    }

    pub async fn navigate_to(&mut self, name: &str) -> ServiceResult<Page> {
        self.navigate(Page::from_name(name)).await
    }

    async fn reload(&mut self, page: Page) -> ServiceResult<()> {
        let context = &mut self.context;
        match page {
            Page::Dashboard => {
                context.dashboard.refresh(Self::today()).await;
            }
            Page::Projects => {
                context.projects.load().await?;
            }
            Page::Activities => {
                context.activities.load().await?;
            }
            Page::Beneficiaries => {
                context.beneficiaries.load().await?;
            }
            Page::Indicators => {
                context.indicators.load().await?;
            }
            Page::Map => {
                context.map.load().await?;
            }
            Page::Reports | Page::Settings => {}
        }
        Ok(())
    }

    /// Drain pending change events; any event refreshes the dashboard once.
    /// Returns the number of events seen.
    pub async fn process_changes(&mut self) -> usize {
        let mut seen = 0;
        loop {
            match self.changes.try_recv() {
                Ok(event) => {
                    debug!("Change in {}", event.collection());
                    seen += 1;
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Skipped {} change events", skipped);
                    seen += skipped as usize;
                }
                Err(_) => break,
            }
        }
        if seen > 0 {
            self.context.dashboard.refresh(Self::today()).await;
        }
        seen
    }

    /// Probe the store, reload every collection and record the sync time
    pub async fn synchronize(&mut self) -> ServiceResult<DateTime<Utc>> {
        if !self.context.is_configured() {
            self.context.notifications.error(messages::MISSING_CONFIGURATION);
            self.current = Page::Settings;
            return Err(ServiceError::Configuration(messages::MISSING_CONFIGURATION.to_string()));
        }

        let notifier = self.context.notifier();
        if !self.context.repository.test_connection().await {
            warn!("Data API unreachable, synchronization aborted");
            notifier.error(messages::SYNC_FAILED);
            return Err(ServiceError::Network(messages::NETWORK_ERROR.to_string()));
        }

        let today = Self::today();
        let context = &mut self.context;
        let (projects, activities, beneficiaries, indicators, map, _) = futures::join!(
            context.projects.load(),
            context.activities.load(),
            context.beneficiaries.load(),
            context.indicators.load(),
            context.map.load(),
            context.dashboard.refresh(today)
        );

        let failure = [
            projects.err(),
            activities.err(),
            beneficiaries.err(),
            indicators.err(),
            map.err(),
        ]
        .into_iter()
        .flatten()
        .next();
        if let Some(e) = failure {
            notifier.error(messages::SYNC_FAILED);
            return Err(e);
        }

        let now = Utc::now();
        self.last_sync = Some(now);
        info!("Synchronized at {}", now.to_rfc3339());
        notifier.success(messages::SYNC_SUCCESS);
        Ok(now)
    }
}
