use super::*;

fn encoded(tokens: &[Token]) -> Vec<u8> {
    ethabi::encode(tokens)
}

#[test]
fn calls_are_prefixed_with_function_selector() {
    let vote = encode_call(&LedgerCall::Vote {
        movie: "Up".to_string(),
    });
    assert_eq!(
        &vote[..4],
        ethabi::short_signature("vote", &[ParamType::String]).as_slice()
    );

    let end = encode_call(&LedgerCall::EndPoll);
    assert_eq!(end, ethabi::short_signature("endPoll", &[]).to_vec());
}

#[test]
fn start_poll_encodes_movies_and_duration() {
    let data = encode_call(&LedgerCall::StartPoll {
        movies: vec!["Dune".to_string(), "Up".to_string()],
        duration_minutes: 1,
    });
    let tokens = ethabi::decode(
        &[
            ParamType::Array(Box::new(ParamType::String)),
            ParamType::Uint(256),
        ],
        &data[4..],
    )
    .expect("decode");
    assert_eq!(
        tokens,
        vec![
            Token::Array(vec![
                Token::String("Dune".to_string()),
                Token::String("Up".to_string()),
            ]),
            Token::Uint(1u64.into()),
        ]
    );
}

#[test]
fn has_voted_read_carries_voter_address() {
    let voter = Address([0xab; 20]);
    let data = encode_read(&LedgerRead::HasVoted { voter });
    assert_eq!(data.len(), 4 + 32);
    assert_eq!(&data[4 + 12..], &[0xab; 20]);
}

#[test]
fn decodes_status_and_rejects_unknown_values() {
    assert_eq!(
        decode_status(&encoded(&[Token::Uint(2u64.into())])).expect("status"),
        PollStatus::Ended
    );
    let err = decode_status(&encoded(&[Token::Uint(7u64.into())])).expect_err("must fail");
    assert!(matches!(err, LedgerError::Decode(_)));
}

#[test]
fn rejects_counts_wider_than_u64() {
    let huge = ethabi::Uint::from(u64::MAX) + ethabi::Uint::from(1u64);
    assert!(decode_u64(&encoded(&[Token::Uint(huge)])).is_err());
}

#[test]
fn decodes_movie_list() {
    let data = encoded(&[Token::Array(vec![
        Token::String("Dune".to_string()),
        Token::String("Up".to_string()),
    ])]);
    assert_eq!(
        decode_string_array(&data).expect("movies"),
        vec!["Dune".to_string(), "Up".to_string()]
    );
}

#[test]
fn decodes_current_poll_with_unset_end_time() {
    let data = encoded(&[
        Token::Uint(0u64.into()),
        Token::Uint(0u64.into()),
        Token::String(String::new()),
    ]);
    let poll = decode_current_poll(&data).expect("current poll");
    assert_eq!(poll.end_time, None);
    assert_eq!(poll.status, PollStatus::NotStarted);
    assert!(poll.winner.is_empty());
}

#[test]
fn decodes_current_poll_end_time_as_utc() {
    let data = encoded(&[
        Token::Uint(1_700_000_000u64.into()),
        Token::Uint(2u64.into()),
        Token::String("Dune".to_string()),
    ]);
    let poll = decode_current_poll(&data).expect("current poll");
    assert_eq!(
        poll.end_time.map(|t| t.timestamp()),
        Some(1_700_000_000)
    );
    assert_eq!(poll.winner, "Dune");
}

#[test]
fn decodes_owner_address() {
    let owner = ethabi::Address::from([0x42; 20]);
    let data = encoded(&[Token::Address(owner)]);
    assert_eq!(decode_address(&data).expect("owner"), Address([0x42; 20]));
}

#[test]
fn extracts_revert_reason() {
    let mut payload = REVERT_ERROR_SELECTOR.to_vec();
    payload.extend(encoded(&[Token::String("Poll not active".to_string())]));
    assert_eq!(
        decode_revert_reason(&payload).as_deref(),
        Some("Poll not active")
    );
    assert_eq!(decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]), None);
}
