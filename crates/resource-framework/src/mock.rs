//! # Mock Clients
//!
//! [`MockClient<T>`] hands out a real [`ResourceClient<T>`] whose requests are
//! answered from a queue of expectations instead of a running pipeline. Use it
//! to test a resource whose hooks call another resource (e.g. posts resolving
//! their author through the users client) without standing the other resource
//! up.
//!
//! | | MockClient | Real actor |
//! |---|---|---|
//! | **State** | none, scripted replies | real collection and cache |
//! | **Error injection** | `return_err(...)` | needs a failing accessor |
//! | **Use case** | logic *around* a client | the pipeline itself, full system |
//!
//! ```rust,ignore
//! let mut users = MockClient::<User>::new();
//! users.expect_model("u1").return_ok(None);
//!
//! let (actor, posts) = ResourceActor::<Post>::new(...);
//! tokio::spawn(actor.run(PostContext::new(UserClient::new(users.client()))));
//!
//! let post = posts.create(params, None).await?;
//! assert!(post.author.is_none());
//! users.verify();
//! ```
//!
//! Expectations are consumed in order. A request that does not match the next
//! expectation panics the mock task, which surfaces in the test as
//! [`ResourceError::ActorDropped`].

use crate::client::ResourceClient;
use crate::entity::ResourceEntity;
use crate::error::ResourceError;
use crate::message::{ResourceRequest, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

enum Expectation<T: ResourceEntity> {
    List {
        response: Result<Vec<T::View>, ResourceError>,
    },
    Get {
        code: String,
        response: Result<T::View, ResourceError>,
    },
    Model {
        code: String,
        response: Result<Option<T>, ResourceError>,
    },
    Create {
        response: Result<T::View, ResourceError>,
    },
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

pub struct MockClient<T: ResourceEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ResourceEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceEntity> MockClient<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio
    /// runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queue.lock().unwrap().pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::List { respond_to, .. },
                        Some(Expectation::List { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Get { code, respond_to },
                        Some(Expectation::Get {
                            code: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(code, expected, "get called with unexpected code");
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Model { code, respond_to },
                        Some(Expectation::Model {
                            code: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(code, expected, "model called with unexpected code");
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => {
                        panic!("Unexpected request or expectation mismatch: {request:?}");
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T::View>> {
        self.builder(|response| Expectation::List { response })
    }

    pub fn expect_get(&mut self, code: impl Into<String>) -> ExpectationBuilder<T, T::View> {
        let code = code.into();
        self.builder(move |response| Expectation::Get { code, response })
    }

    pub fn expect_model(&mut self, code: impl Into<String>) -> ExpectationBuilder<T, Option<T>> {
        let code = code.into();
        self.builder(move |response| Expectation::Model { code, response })
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::View> {
        self.builder(|response| Expectation::Create { response })
    }

    /// Panics if any expectation is left unconsumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    fn builder<R>(
        &mut self,
        make: impl FnOnce(Result<R, ResourceError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
            make: Box::new(make),
        }
    }
}

/// Scripts the reply of one expected request.
pub struct ExpectationBuilder<T: ResourceEntity, R> {
    expectations: Queue<T>,
    make: Box<dyn FnOnce(Result<R, ResourceError>) -> Expectation<T> + Send>,
}

impl<T: ResourceEntity, R> ExpectationBuilder<T, R> {
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: ResourceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, ResourceError>) {
        let expectation = (self.make)(response);
        self.expectations.lock().unwrap().push_back(expectation);
    }
}

/// A client plus the receiving end of its channel, for tests that want to
/// inspect raw requests and answer them by hand.
pub fn create_mock_client<T: ResourceEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Waits for the next request and returns it if it is a `model` lookup.
pub async fn next_model<T: ResourceEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(String, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Model { code, respond_to }) => Some((code, respond_to)),
        _ => None,
    }
}
