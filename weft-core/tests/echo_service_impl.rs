use echo_service::EchoService;
use echo_service::pb::{EchoRequest, EchoResponse};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tonic::{Request, Response, Status};

/// Echoes the request message back and mirrors the `x-request-id` header.
/// Counts unary invocations so tests can assert a call never reached the
/// server.
pub struct EchoServiceImpl {
    unary_calls: Arc<AtomicUsize>,
}

impl EchoServiceImpl {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        (
            Self {
                unary_calls: Arc::clone(&counter),
            },
            counter,
        )
    }
}

#[tonic::async_trait]
impl EchoService for EchoServiceImpl {
    async fn unary_echo(
        &self,
        request: Request<EchoRequest>,
    ) -> Result<Response<EchoResponse>, Status> {
        self.unary_calls.fetch_add(1, Ordering::SeqCst);

        let request_id = request.metadata().get("x-request-id").cloned();
        let message = request.into_inner().message;

        let mut response = Response::new(EchoResponse { message });
        if let Some(id) = request_id {
            response.metadata_mut().insert("x-request-id", id);
        }
        Ok(response)
    }

    async fn failing_echo(
        &self,
        _request: Request<EchoRequest>,
    ) -> Result<Response<EchoResponse>, Status> {
        Err(Status::failed_precondition("scripted failure"))
    }
}
