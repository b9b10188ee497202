use std::collections::VecDeque;
use std::sync::Mutex;

use pixelrelay_core::JobId;

use super::{Accepted, BackendError, ProcessingBackend, SubmissionRequest};

/// Processing backend that answers from a script, for tests/dev.
///
/// Queued answers are returned in order; once the script runs out every
/// request is accepted with a generated id (`job-1`, `job-2`, ...).
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<Accepted, BackendError>>>,
    requests: Mutex<Vec<SubmissionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepting(self, id: &str) -> Self {
        let accepted = JobId::parse(id).map(|id| Accepted {
            id,
            status: Some("starting".to_string()),
            model_version: None,
        });
        match accepted {
            Ok(accepted) => self.then(Ok(accepted)),
            Err(err) => self.then(Err(BackendError::InvalidResponse(err.to_string()))),
        }
    }

    pub fn failing(self, err: BackendError) -> Self {
        self.then(Err(err))
    }

    fn then(self, answer: Result<Accepted, BackendError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(answer);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ProcessingBackend for ScriptedBackend {
    async fn submit(&self, request: &SubmissionRequest) -> Result<Accepted, BackendError> {
        let call = {
            let mut requests = self
                .requests
                .lock()
                .map_err(|_| BackendError::InvalidResponse("script poisoned".to_string()))?;
            requests.push(request.clone());
            requests.len()
        };

        let scripted = self
            .script
            .lock()
            .map_err(|_| BackendError::InvalidResponse("script poisoned".to_string()))?
            .pop_front();

        match scripted {
            Some(answer) => answer,
            None => Ok(Accepted {
                id: JobId::parse(format!("job-{call}"))
                    .map_err(|e| BackendError::InvalidResponse(e.to_string()))?,
                status: Some("starting".to_string()),
                model_version: None,
            }),
        }
    }
}
