//! Persistence submitter: runs a dispatched save against the service.

use tracing::debug;

use super::context::RequestTag;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{SaveAck, SavePayload};
use crate::services::ChequeService;

/// A dispatched save. Carries the values as they were at dispatch.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    tag: RequestTag,
    payload: SavePayload,
}

impl SaveTicket {
    pub(crate) fn new(tag: RequestTag, payload: SavePayload) -> Self {
        Self { tag, payload }
    }

    pub fn tag(&self) -> RequestTag {
        self.tag
    }

    pub fn payload(&self) -> &SavePayload {
        &self.payload
    }

    pub fn resolve(self, result: ServiceResult<SaveAck>) -> SaveOutcome {
        SaveOutcome {
            tag: self.tag,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub tag: RequestTag,
    pub result: ServiceResult<SaveAck>,
}

/// Send the record. An answer with `success: false` counts as a failure.
pub async fn run<S>(service: &S, ticket: SaveTicket) -> SaveOutcome
where
    S: ChequeService + ?Sized,
{
    let SaveTicket { tag, payload } = ticket;
    debug!(request_id = %tag.request_id, cheque_number = %payload.cheque_number, "Running save");

    let result = service.save(&payload).await.and_then(|ack| {
        if ack.success {
            Ok(ack)
        } else {
            Err(ServiceError::Refused(ack.message))
        }
    });

    SaveOutcome { tag, result }
}
