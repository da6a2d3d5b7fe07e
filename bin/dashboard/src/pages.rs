//! Page components, one per route.

pub mod builder;
pub mod dashboard;
pub mod dead_letter;
pub mod login;
pub mod run_detail;

pub use builder::BuilderPage;
pub use dashboard::DashboardPage;
pub use dead_letter::DeadLetterPage;
pub use login::{LoginPage, RegisterPage};
pub use run_detail::RunDetailPage;
