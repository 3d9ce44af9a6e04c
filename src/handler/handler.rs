use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::HandlerError;
use crate::slack;
use crate::token::TokenSource;
use crate::types::{Environment, USAGE_TEXT};

/// Entry point for one slash-command invocation.
///
/// Every domain failure becomes a bare status code; `Err` is only returned
/// when the response itself cannot be built.
pub async fn function_handler<T>(
    event: Request,
    config: &Config,
    tokens: &T,
) -> Result<Response<Body>, Error>
where
    T: TokenSource + ?Sized,
{
    match handle_slash_command(&event, config, tokens).await {
        Ok(text) => text_response(text),
        Err(err) => {
            match &err {
                HandlerError::UpstreamUnavailable(_) => error!("token claim failed: {err}"),
                _ => warn!("rejecting request: {err}"),
            }
            empty_response(err.status())
        }
    }
}

async fn handle_slash_command<T>(
    event: &Request,
    config: &Config,
    tokens: &T,
) -> Result<String, HandlerError>
where
    T: TokenSource + ?Sized,
{
    // Verification and parsing both read this one captured slice.
    let body: &[u8] = event.body().as_ref();

    slack::verify_slack_request(&config.signing_secret, event.headers(), body)?;
    let command = slack::parse_slash_command(body)?;

    let Some(environment) = Environment::from_command_text(&command.text) else {
        info!(user_id = %command.user_id, "no environment named, sending usage");
        return Ok(USAGE_TEXT.to_string());
    };

    info!(
        %environment,
        command = %command.command,
        user_id = %command.user_id,
        channel_id = %command.channel_id,
        "claiming token"
    );

    let token = tokens.claim_token(&config.target(environment)).await?;

    Ok(format!("{} token: {}", environment.display_name(), token))
}

fn text_response(text: String) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Body::from(text))?)
}

fn empty_response(status: StatusCode) -> Result<Response<Body>, Error> {
    Ok(Response::builder().status(status).body(Body::Empty)?)
}
