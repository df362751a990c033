//! Results of background backend calls, delivered to the update loop

use crate::api::ApiResult;
use crate::state::{
    EntityId, EntityKind, EntitySummary, LoadedOptions, OptionRequest, SessionUser,
    SubmissionResult, SubmitTicket,
};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    SessionChecked(ApiResult<Option<SessionUser>>),
    LoggedIn(ApiResult<SessionUser>),
    LoggedOut(ApiResult<()>),
    ListLoaded {
        kind: EntityKind,
        result: ApiResult<Vec<EntitySummary>>,
    },
    OptionsLoaded {
        request: OptionRequest,
        result: ApiResult<LoadedOptions>,
    },
    Submitted {
        ticket: SubmitTicket,
        kind: EntityKind,
        result: SubmissionResult,
    },
    Deleted {
        ticket: SubmitTicket,
        kind: EntityKind,
        id: EntityId,
        result: ApiResult<()>,
    },
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
