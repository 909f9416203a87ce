pub mod alert;
pub mod audit;
pub mod notification;
pub mod settings;
pub mod users;
pub mod visit;

pub use alert::AlertService;
pub use audit::AuditService;
pub use notification::{Mailer, NotificationResult, NotificationService, SmtpMailer};
pub use settings::SettingsService;
pub use users::UsersService;
pub use visit::VisitService;
