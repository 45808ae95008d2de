mod activity;
mod medal;
mod notification;
mod user;
mod vacancy;

pub use activity::{Activity, ActivityLink, ActivityStatus, InvitationStatus, Observation, Participant};
pub use medal::{BadgeAward, MedalType};
pub use notification::{Notification, NotificationKind};
pub use user::{Experience, User, UserType};
pub use vacancy::{
    ApplicationStatus, ContractType, Modality, Seniority, Vacancy, VacancyApplication, VacancyStatus,
};
