// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use bubbles_adapters::DeviceAdapter;
use bubbles_core::Chatter;
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Handle a single client connection
pub async fn handle_connection<D: DeviceAdapter>(
    daemon: &mut DaemonState<D>,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handle_request(daemon, request).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub(crate) async fn handle_request<D: DeviceAdapter>(
    daemon: &mut DaemonState<D>,
    request: Request,
) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Chat { user, level, text } => {
            let chatter = Chatter::new(user, level);
            let reply = daemon.commands.handle(&chatter, &text).await;
            Response::Chat { reply }
        }

        Request::Donation {
            name,
            amount,
            message,
        } => {
            if !amount.is_finite() || amount < 0.0 {
                return Response::Error {
                    message: format!("Invalid donation amount: {}", amount),
                };
            }
            let triggered = daemon.donations.notify_donation(&name, amount, &message);
            Response::Donation { triggered }
        }

        Request::Status => {
            let status = daemon.accumulator.status();
            Response::Status {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                enabled: status.enabled,
                active: status.active,
                blast_duration: status.blast_duration,
                donation_threshold: status.donation_threshold,
            }
        }

        Request::DeviceState => Response::DeviceState {
            on: daemon.accumulator.device_state().await,
        },

        Request::Toggle => {
            if daemon.accumulator.toggle().await {
                Response::Ok
            } else {
                Response::Error {
                    message: "Switch did not acknowledge toggle".to_string(),
                }
            }
        }

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
