//! Third-party login handshake.
//!
//! Logging in is asynchronous on purpose: the CLI creates a login request,
//! hands the user a browser URL, and polls until the identity provider's
//! redirect answers the request or the poll budget runs out. The server
//! side of the exchange sits behind [`LoginTransport`] so the whole
//! handshake runs against a fake in tests.

use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::core::domain::{LoginRequest, User};
use crate::error::{RemoteError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_POLLS: u32 = 12;

/// Server exchange needed by the handshake.
pub trait LoginTransport {
    fn create_login_request(&self) -> Result<LoginRequest>;
    fn poll_login_request(&self, temporary_code: &str) -> Result<LoginRequest>;
    /// Register `public_key` and trade the answered request for the
    /// user's identity and a session token.
    fn complete_login(&self, temporary_code: &str, public_key: &str) -> Result<(User, String)>;
}

/// Outcome of waiting for the provider redirect.
#[derive(Debug)]
pub enum LoginWait {
    Ready(LoginRequest),
    TimedOut,
}

/// Browser URL the user opens to authenticate.
pub fn login_url(server_url: &str, temporary_code: &str) -> String {
    format!(
        "{}/login?code={}",
        server_url.trim_end_matches('/'),
        temporary_code
    )
}

/// One login attempt: start, wait, finish.
pub struct LoginHandshake<T> {
    transport: T,
    poll_interval: Duration,
    max_polls: u32,
    request: Option<LoginRequest>,
}

impl<T: LoginTransport + Sync> LoginHandshake<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
            request: None,
        }
    }

    /// Override the poll cadence. Tests use a zero interval.
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Create the login request and return its temporary code.
    pub fn start(&mut self) -> Result<&LoginRequest> {
        let request = self.transport.create_login_request()?;
        debug!(temporary_code = %request.temporary_code, "login request created");

        Ok(self.request.insert(request))
    }

    /// Block until the provider redirect answers the request, the poll
    /// budget runs out, or the server reports an error.
    ///
    /// Polling happens on a worker thread; the result crosses back over a
    /// rendezvous channel so the worker never outlives the wait.
    pub fn wait(&self) -> Result<LoginWait> {
        let request = self.pending()?;
        let code = request.temporary_code.clone();

        let (tx, rx) = mpsc::sync_channel::<Result<LoginWait>>(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let outcome = self.poll_until_answered(&code);
                // Receiver is alive until the send completes.
                let _ = tx.send(outcome);
            });

            rx.recv()
                .unwrap_or_else(|_| Err(RemoteError::PollInterrupted.into()))
        })
    }

    fn poll_until_answered(&self, temporary_code: &str) -> Result<LoginWait> {
        for attempt in 1..=self.max_polls {
            let request = self.transport.poll_login_request(temporary_code)?;

            if request.is_answered() {
                debug!(attempt, "login request answered");
                return Ok(LoginWait::Ready(request));
            }

            trace!(attempt, "login request still pending");
            if attempt < self.max_polls {
                std::thread::sleep(self.poll_interval);
            }
        }

        Ok(LoginWait::TimedOut)
    }

    /// Complete the handshake, registering `public_key` with the server.
    pub fn finish(&self, public_key: &str) -> Result<(User, String)> {
        let request = self.pending()?;
        self.transport
            .complete_login(&request.temporary_code, public_key)
    }

    fn pending(&self) -> Result<&LoginRequest> {
        self.request
            .as_ref()
            .ok_or_else(|| RemoteError::LoginRequestNotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    fn request(code: &str, auth_code: &str) -> LoginRequest {
        LoginRequest {
            id: 1,
            temporary_code: code.into(),
            auth_code: auth_code.into(),
            answered: !auth_code.is_empty(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Answers the request after a fixed number of polls.
    struct AnswersAfter {
        polls_needed: u32,
        polls_seen: Mutex<u32>,
    }

    impl LoginTransport for AnswersAfter {
        fn create_login_request(&self) -> Result<LoginRequest> {
            Ok(request("tmp-1", ""))
        }

        fn poll_login_request(&self, code: &str) -> Result<LoginRequest> {
            let mut seen = self.polls_seen.lock().unwrap();
            *seen += 1;
            if *seen >= self.polls_needed {
                Ok(request(code, "provider-auth-code"))
            } else {
                Ok(request(code, ""))
            }
        }

        fn complete_login(&self, _code: &str, public_key: &str) -> Result<(User, String)> {
            let mut user = User::default();
            user.username = "alice".into();
            user.keys.cipher = public_key.into();
            Ok((user, "session-token".into()))
        }
    }

    struct AlwaysFails;

    impl LoginTransport for AlwaysFails {
        fn create_login_request(&self) -> Result<LoginRequest> {
            Ok(request("tmp-1", ""))
        }

        fn poll_login_request(&self, _code: &str) -> Result<LoginRequest> {
            Err(RemoteError::LoginRequestNotFound.into())
        }

        fn complete_login(&self, _code: &str, _key: &str) -> Result<(User, String)> {
            unreachable!()
        }
    }

    fn fast(handshake: LoginHandshake<AnswersAfter>, max_polls: u32) -> LoginHandshake<AnswersAfter> {
        handshake.with_polling(Duration::ZERO, max_polls)
    }

    #[test]
    fn answered_request_is_ready() {
        let transport = AnswersAfter {
            polls_needed: 3,
            polls_seen: Mutex::new(0),
        };
        let mut handshake = fast(LoginHandshake::new(transport), 12);

        handshake.start().unwrap();
        match handshake.wait().unwrap() {
            LoginWait::Ready(req) => assert!(req.is_answered()),
            LoginWait::TimedOut => panic!("expected the request to be answered"),
        }

        let (user, token) = handshake.finish("age1publickey").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(token, "session-token");
    }

    #[test]
    fn poll_budget_exhaustion_times_out() {
        let transport = AnswersAfter {
            polls_needed: 100,
            polls_seen: Mutex::new(0),
        };
        let mut handshake = fast(LoginHandshake::new(transport), 4);

        handshake.start().unwrap();
        assert!(matches!(handshake.wait().unwrap(), LoginWait::TimedOut));
    }

    #[test]
    fn server_error_propagates_out_of_wait() {
        let mut handshake =
            LoginHandshake::new(AlwaysFails).with_polling(Duration::ZERO, 12);

        handshake.start().unwrap();
        let err = handshake.wait().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Remote(RemoteError::LoginRequestNotFound)
        ));
    }

    #[test]
    fn wait_before_start_is_an_error() {
        let transport = AnswersAfter {
            polls_needed: 1,
            polls_seen: Mutex::new(0),
        };
        let handshake = fast(LoginHandshake::new(transport), 1);
        assert!(handshake.wait().is_err());
    }
}
