//! Per-viewer view of a vacancy: what the viewer may see and do with it.
//!
//! Everything here is pure; handlers load the vacancy and the viewer's
//! application status and ask these functions for the verdict.

use serde::Serialize;

use crate::{
    models::{ApplicationStatus, UserType, Vacancy, VacancyStatus},
    session::Principal,
};

#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub id: &'a str,
    pub user_type: UserType,
    pub curso: Option<&'a str>,
}

impl<'a> From<&'a Principal> for Viewer<'a> {
    fn from(principal: &'a Principal) -> Self {
        Viewer {
            id: &principal.id,
            user_type: principal.user_type,
            curso: principal.curso.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    pub can_edit: bool,
    pub can_apply: bool,
    pub can_manage_applications: bool,
    pub application_status: Option<ApplicationStatus>,
    pub course_match: bool,
}

/// Why a viewer may not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyBlock {
    SignedOut,
    NotStudent,
    NotOpen,
    AlreadyAccepted,
}

pub fn is_owner(vacancy: &Vacancy, viewer: Option<Viewer<'_>>) -> bool {
    viewer.is_some_and(|v| v.id == vacancy.recruiter_id)
}

/// Drafts exist only for their owner.
pub fn visible_to(vacancy: &Vacancy, viewer: Option<Viewer<'_>>) -> bool {
    !vacancy.is_draft || is_owner(vacancy, viewer)
}

pub fn apply_block(
    vacancy: &Vacancy,
    viewer: Option<Viewer<'_>>,
    application_status: Option<ApplicationStatus>,
) -> Option<ApplyBlock> {
    let Some(viewer) = viewer else {
        return Some(ApplyBlock::SignedOut);
    };
    if viewer.user_type != UserType::Aluno {
        return Some(ApplyBlock::NotStudent);
    }
    if vacancy.is_draft || vacancy.status != VacancyStatus::Open {
        return Some(ApplyBlock::NotOpen);
    }
    if application_status == Some(ApplicationStatus::Accepted) {
        return Some(ApplyBlock::AlreadyAccepted);
    }
    None
}

fn course_match(vacancy: &Vacancy, viewer: Option<Viewer<'_>>) -> bool {
    let Some(curso) = viewer.and_then(|v| v.curso).map(str::trim).filter(|c| !c.is_empty()) else {
        return false;
    };
    match vacancy.course.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(course) => course.to_lowercase() == curso.to_lowercase(),
    }
}

pub fn project(
    vacancy: &Vacancy,
    viewer: Option<Viewer<'_>>,
    application_status: Option<ApplicationStatus>,
) -> ViewerState {
    let can_edit = is_owner(vacancy, viewer);
    ViewerState {
        can_edit,
        can_apply: apply_block(vacancy, viewer, application_status).is_none(),
        can_manage_applications: can_edit,
        application_status,
        course_match: course_match(vacancy, viewer),
    }
}
