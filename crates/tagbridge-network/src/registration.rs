//! One-shot tag registration.

use tagbridge_protocol::{MessageType, RegistrationRequest, RegistrationResponse};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{TcpClient, TcpClientConfig, TcpClientError};

/// Why a registration did not succeed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Connect, send or receive failed (including timeouts).
    #[error(transparent)]
    Transport(#[from] TcpClientError),

    /// Server answered with something other than a data response.
    #[error("Unexpected response type {0}")]
    UnexpectedResponse(MessageType),

    /// Data response too short to carry a status.
    #[error("Malformed response: {0}")]
    Malformed(#[from] tagbridge_core::Error),

    /// Server processed the request and refused it.
    #[error("Server rejected registration with status {status}")]
    Rejected {
        status: u8,
        response: RegistrationResponse,
    },
}

/// Register one tag: connect, send the request, read the response, close.
///
/// Succeeds only when the server answers with a data response whose status
/// is OK. The connection is closed on every path, including errors.
///
/// # Errors
///
/// See [`RegistrationError`].
pub async fn register_tag(
    config: &TcpClientConfig,
    request: RegistrationRequest,
) -> Result<RegistrationResponse, RegistrationError> {
    let uid = request.uid.clone();
    let mut client = TcpClient::new(config.clone());

    let result = match client.connect().await {
        Ok(()) => exchange(&mut client, request).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = client.close().await {
        debug!("Error closing registration connection: {}", e);
    }

    match &result {
        Ok(_) => info!(%uid, "Tag registered"),
        Err(e) => warn!(%uid, error = %e, "Tag registration failed"),
    }
    result
}

async fn exchange(
    client: &mut TcpClient,
    request: RegistrationRequest,
) -> Result<RegistrationResponse, RegistrationError> {
    client.send(request.into_message()).await?;
    let message = client.recv().await?;

    if message.message_type != MessageType::NfcData {
        return Err(RegistrationError::UnexpectedResponse(message.message_type));
    }

    let response = RegistrationResponse::parse(&message.payload)?;
    if !response.is_success() {
        return Err(RegistrationError::Rejected {
            status: response.status.to_u8(),
            response,
        });
    }
    Ok(response)
}
