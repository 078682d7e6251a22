//! Contract calldata encoding and return-data decoding for the poll ABI.

use chrono::DateTime;
use ethabi::{ParamType, Token};
use shared::{
    domain::{Address, CurrentPoll, PollStatus},
    error::LedgerError,
    protocol::{LedgerCall, LedgerRead},
};

/// Selector of the standard `Error(string)` revert payload.
const REVERT_ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

pub fn encode_call(call: &LedgerCall) -> Vec<u8> {
    let (params, tokens) = match call {
        LedgerCall::StartPoll {
            movies,
            duration_minutes,
        } => (
            vec![
                ParamType::Array(Box::new(ParamType::String)),
                ParamType::Uint(256),
            ],
            vec![
                Token::Array(movies.iter().cloned().map(Token::String).collect()),
                Token::Uint((*duration_minutes).into()),
            ],
        ),
        LedgerCall::Vote { movie } => (vec![ParamType::String], vec![Token::String(movie.clone())]),
        LedgerCall::Revote { new_movie } => (
            vec![ParamType::String],
            vec![Token::String(new_movie.clone())],
        ),
        LedgerCall::EndPoll => (Vec::new(), Vec::new()),
    };
    with_selector(call.function_name(), &params, &tokens)
}

pub fn encode_read(read: &LedgerRead) -> Vec<u8> {
    let (params, tokens) = match read {
        LedgerRead::Votes { movie } => (vec![ParamType::String], vec![Token::String(movie.clone())]),
        LedgerRead::HasVoted { voter } => (
            vec![ParamType::Address],
            vec![Token::Address(ethabi::Address::from(voter.0))],
        ),
        LedgerRead::PollStatus
        | LedgerRead::RemainingTime
        | LedgerRead::Movies
        | LedgerRead::Winner
        | LedgerRead::Owner
        | LedgerRead::CurrentPoll => (Vec::new(), Vec::new()),
    };
    with_selector(read.function_name(), &params, &tokens)
}

fn with_selector(name: &str, params: &[ParamType], tokens: &[Token]) -> Vec<u8> {
    let mut data = ethabi::short_signature(name, params).to_vec();
    data.extend(ethabi::encode(tokens));
    data
}

fn decode_tokens(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, LedgerError> {
    ethabi::decode(types, data).map_err(|err| LedgerError::Decode(err.to_string()))
}

fn single(types: &[ParamType], data: &[u8]) -> Result<Token, LedgerError> {
    decode_tokens(types, data)?
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::Decode("empty return data".to_string()))
}

fn token_to_u64(token: Token) -> Result<u64, LedgerError> {
    let value = token
        .into_uint()
        .ok_or_else(|| LedgerError::Decode("expected uint".to_string()))?;
    if value > ethabi::Uint::from(u64::MAX) {
        return Err(LedgerError::Decode(format!("integer {value} exceeds u64")));
    }
    Ok(value.low_u64())
}

fn token_to_string(token: Token) -> Result<String, LedgerError> {
    token
        .into_string()
        .ok_or_else(|| LedgerError::Decode("expected string".to_string()))
}

pub fn decode_u64(data: &[u8]) -> Result<u64, LedgerError> {
    token_to_u64(single(&[ParamType::Uint(256)], data)?)
}

pub fn decode_status(data: &[u8]) -> Result<PollStatus, LedgerError> {
    PollStatus::try_from(token_to_u64(single(&[ParamType::Uint(8)], data)?)?)
}

pub fn decode_string(data: &[u8]) -> Result<String, LedgerError> {
    token_to_string(single(&[ParamType::String], data)?)
}

pub fn decode_string_array(data: &[u8]) -> Result<Vec<String>, LedgerError> {
    single(&[ParamType::Array(Box::new(ParamType::String))], data)?
        .into_array()
        .ok_or_else(|| LedgerError::Decode("expected string[]".to_string()))?
        .into_iter()
        .map(token_to_string)
        .collect()
}

pub fn decode_bool(data: &[u8]) -> Result<bool, LedgerError> {
    single(&[ParamType::Bool], data)?
        .into_bool()
        .ok_or_else(|| LedgerError::Decode("expected bool".to_string()))
}

pub fn decode_address(data: &[u8]) -> Result<Address, LedgerError> {
    let address = single(&[ParamType::Address], data)?
        .into_address()
        .ok_or_else(|| LedgerError::Decode("expected address".to_string()))?;
    Ok(Address(address.0))
}

pub fn decode_current_poll(data: &[u8]) -> Result<CurrentPoll, LedgerError> {
    let mut tokens = decode_tokens(
        &[ParamType::Uint(256), ParamType::Uint(8), ParamType::String],
        data,
    )?
    .into_iter();
    let (Some(end_time), Some(status), Some(winner)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(LedgerError::Decode("currentPoll returned too few values".to_string()));
    };

    let end_time = token_to_u64(end_time)?;
    let end_time = if end_time == 0 {
        None
    } else {
        let secs = i64::try_from(end_time)
            .map_err(|_| LedgerError::Decode(format!("end time {end_time} out of range")))?;
        Some(
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| LedgerError::Decode(format!("end time {secs} out of range")))?,
        )
    };

    Ok(CurrentPoll {
        end_time,
        status: PollStatus::try_from(token_to_u64(status)?)?,
        winner: token_to_string(winner)?,
    })
}

/// Extracts the reason from an `Error(string)` revert payload.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(REVERT_ERROR_SELECTOR.as_slice())?;
    decode_string(payload).ok()
}

#[cfg(test)]
#[path = "tests/abi_tests.rs"]
mod tests;
