#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    use serde_json::json;
    use sha2::{Digest, Sha256};

    use crate::address::{candidate_seed, poll_seed, CANDIDATE_TAG, POLL_TAG, RECEIPT_TAG};
    use crate::*;

    const DESCRIPTION: &str = "Which country that you really wanted to visit?";
    const POLL_END: i64 = 1_867_777_767;

    fn authority() -> CallerIdentity {
        CallerIdentity::from_label("authority")
    }

    fn voter(n: usize) -> CallerIdentity {
        CallerIdentity::from_label(&format!("voter-{n}"))
    }

    fn at(signer: CallerIdentity, now: i64) -> InvocationContext {
        InvocationContext::now(signer, &FixedClock(now))
    }

    fn setup_with(config: ProgramConfig, candidates: &[&str]) -> (MemoryLedger, PollProcessor) {
        let ledger = MemoryLedger::new();
        let processor = PollProcessor::new(config);
        let admin = at(authority(), 0);
        processor.open_poll(&ledger, &admin, 1, DESCRIPTION, 0, POLL_END).unwrap();
        candidates
            .iter()
            .for_each(|name| processor.register_candidate(&ledger, &admin, 1, *name).unwrap());
        (ledger, processor)
    }

    fn setup(candidates: &[&str]) -> (MemoryLedger, PollProcessor) {
        setup_with(ProgramConfig::default(), candidates)
    }

    fn votes(ledger: &MemoryLedger, name: &str) -> u64 {
        get_candidate(ledger, 1, name).unwrap().unwrap().candidate_votes
    }

    #[test]
    fn test_open_register_vote_scenario() {
        let ledger = MemoryLedger::new();
        let processor = PollProcessor::default();
        let admin = at(authority(), 0);

        processor.open_poll(&ledger, &admin, 1, DESCRIPTION, 0, POLL_END).unwrap();
        let poll = get_poll(&ledger, 1).unwrap().unwrap();
        assert_eq!(poll.poll_id, 1);
        assert_eq!(poll.description, DESCRIPTION);
        assert!(poll.poll_start < poll.poll_end);

        processor.register_candidate(&ledger, &admin, 1, "Japan").unwrap();
        let japan = get_candidate(&ledger, 1, "Japan").unwrap().unwrap();
        assert_eq!(japan.candidate_name, "Japan");
        assert_eq!(japan.candidate_votes, 0);

        processor.cast_vote(&ledger, &at(voter(1), 1_700_000_000), 1, "Japan").unwrap();
        assert_eq!(votes(&ledger, "Japan"), 1);
    }

    #[test]
    fn test_open_poll_stores_fields() {
        let ledger = MemoryLedger::new();
        let processor = PollProcessor::default();
        let cases = [
            (0, "", i64::MIN, i64::MAX),
            (42, "Lunch?", -10, -9),
            (u64::MAX, "Last poll", 1_000, 2_000),
        ];

        for (poll_id, description, start, end) in cases {
            processor.open_poll(&ledger, &at(authority(), 0), poll_id, description, start, end).unwrap();
            assert_eq!(
                get_poll(&ledger, poll_id).unwrap(),
                Some(PollRecord {
                    poll_id,
                    description: description.to_string(),
                    poll_start: start,
                    poll_end: end,
                })
            );
        }
        assert_eq!(get_poll(&ledger, 7).unwrap(), None);
    }

    #[test]
    fn test_duplicate_poll_is_rejected() {
        let (ledger, processor) = setup(&[]);
        let before = ledger.snapshot().unwrap();

        let err = processor
            .open_poll(&ledger, &at(authority(), 0), 1, "Another question", 5, 10)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(ledger.snapshot().unwrap(), before);
        assert_eq!(get_poll(&ledger, 1).unwrap().unwrap().description, DESCRIPTION);
    }

    #[test]
    fn test_invalid_poll_input() {
        let ledger = MemoryLedger::new();
        let processor = PollProcessor::default();
        let admin = at(authority(), 0);

        let err = processor.open_poll(&ledger, &admin, 1, DESCRIPTION, 10, 10).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        let err = processor.open_poll(&ledger, &admin, 1, DESCRIPTION, 11, 10).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let too_long = "x".repeat(MAX_DESCRIPTION_LENGTH + 1);
        let err = processor.open_poll(&ledger, &admin, 1, too_long, 0, 10).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(ledger.snapshot().unwrap().is_empty());

        let at_limit = "x".repeat(MAX_DESCRIPTION_LENGTH);
        processor.open_poll(&ledger, &admin, 1, at_limit, 0, 10).unwrap();
    }

    #[test]
    fn test_register_candidate_requires_poll() {
        let ledger = MemoryLedger::new();
        let processor = PollProcessor::default();

        let err = processor
            .register_candidate(&ledger, &at(authority(), 0), 9, "Japan")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(ledger.snapshot().unwrap().is_empty());
        assert_eq!(get_candidate(&ledger, 9, "Japan").unwrap(), None);
    }

    #[test]
    fn test_duplicate_candidate_keeps_votes() {
        let (ledger, processor) = setup(&["Patrick", "Jack Lahuna Laguna"]);
        processor.cast_vote(&ledger, &at(voter(1), 1), 1, "Patrick").unwrap();

        let err = processor
            .register_candidate(&ledger, &at(authority(), 0), 1, "Patrick")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(votes(&ledger, "Patrick"), 1);
        assert_eq!(votes(&ledger, "Jack Lahuna Laguna"), 0);
    }

    #[test]
    fn test_candidate_name_bounds() {
        let (ledger, processor) = setup(&[]);
        let admin = at(authority(), 0);

        let err = processor.register_candidate(&ledger, &admin, 1, "").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let too_long = "n".repeat(MAX_CANDIDATE_NAME_LENGTH + 1);
        let err = processor.register_candidate(&ledger, &admin, 1, too_long.as_str()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(matches!(derive_candidate_key(1, &too_long), Err(AddressError::SeedTooLong(33))));
        assert_eq!(get_candidate(&ledger, 1, &too_long).unwrap_err().code, ErrorCode::InvalidInput);

        let err = processor.cast_vote(&ledger, &at(voter(1), 1), 1, too_long.as_str()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let at_limit = "n".repeat(MAX_CANDIDATE_NAME_LENGTH);
        processor.register_candidate(&ledger, &admin, 1, at_limit.as_str()).unwrap();
        assert_eq!(get_candidate(&ledger, 1, &at_limit).unwrap().unwrap().candidate_votes, 0);
    }

    #[test]
    fn test_sequential_votes() {
        let (ledger, processor) = setup(&["Japan", "Kyrgyztan"]);

        processor.cast_vote(&ledger, &at(voter(1), 1), 1, "Japan").unwrap();
        assert_eq!(votes(&ledger, "Japan"), 1);

        for n in 0..25 {
            processor.cast_vote(&ledger, &at(voter(n), 100 + n as i64), 1, "Japan").unwrap();
        }
        assert_eq!(votes(&ledger, "Japan"), 26);
        assert_eq!(votes(&ledger, "Kyrgyztan"), 0);
    }

    #[test]
    fn test_vote_outside_window() {
        let ledger = MemoryLedger::new();
        let processor = PollProcessor::default();
        let admin = at(authority(), 0);
        processor.open_poll(&ledger, &admin, 3, "Window", 1_000, 2_000).unwrap();
        processor.register_candidate(&ledger, &admin, 3, "Japan").unwrap();
        let before = ledger.snapshot().unwrap();

        for now in [999, 2_000, 2_001, i64::MAX] {
            let err = processor.cast_vote(&ledger, &at(voter(1), now), 3, "Japan").unwrap_err();
            assert_eq!(err.code, ErrorCode::NotOpen, "now = {now}");
        }
        assert_eq!(ledger.snapshot().unwrap(), before);

        processor.cast_vote(&ledger, &at(voter(1), 1_000), 3, "Japan").unwrap();
        processor.cast_vote(&ledger, &at(voter(1), 1_999), 3, "Japan").unwrap();
        assert_eq!(get_candidate(&ledger, 3, "Japan").unwrap().unwrap().candidate_votes, 2);
    }

    #[test]
    fn test_vote_requires_poll_and_candidate() {
        let (ledger, processor) = setup(&["Japan"]);
        let before = ledger.snapshot().unwrap();

        let err = processor.cast_vote(&ledger, &at(voter(1), 1), 1, "Swizzterland").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = processor.cast_vote(&ledger, &at(voter(1), 1), 2, "Japan").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert_eq!(ledger.snapshot().unwrap(), before);
    }

    #[test]
    fn test_concurrent_votes_are_not_lost() {
        const THREADS: usize = 8;
        const VOTES_PER_THREAD: usize = 50;

        let (ledger, processor) = setup(&["Japan", "Kyrgyztan"]);
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                let processor = processor.clone();
                thread::spawn(move || {
                    let candidate = if t % 2 == 0 { "Japan" } else { "Kyrgyztan" };
                    for _ in 0..VOTES_PER_THREAD {
                        processor.cast_vote(&*ledger, &at(voter(t), 10), 1, candidate).unwrap();
                        processor.cast_vote(&*ledger, &at(voter(t), 10), 1, "Japan").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let expected_japan = THREADS * VOTES_PER_THREAD + (THREADS / 2) * VOTES_PER_THREAD;
        let expected_kyrgyztan = (THREADS / 2) * VOTES_PER_THREAD;
        assert_eq!(votes(&ledger, "Japan"), expected_japan as u64);
        assert_eq!(votes(&ledger, "Kyrgyztan"), expected_kyrgyztan as u64);
    }

    #[test]
    fn test_authority_policy() {
        let config = ProgramConfig {
            authority: AuthorityPolicy::Only(vec![authority()]),
            ..ProgramConfig::default()
        };
        let (ledger, processor) = setup_with(config, &["Japan"]);
        let outsider = at(voter(1), 0);

        let err = processor.open_poll(&ledger, &outsider, 2, "Mine", 0, 10).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(get_poll(&ledger, 2).unwrap(), None);

        let err = processor.register_candidate(&ledger, &outsider, 1, "Switzerland").unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(get_candidate(&ledger, 1, "Switzerland").unwrap(), None);

        processor.cast_vote(&ledger, &at(voter(1), 5), 1, "Japan").unwrap();
        assert_eq!(votes(&ledger, "Japan"), 1);
    }

    #[test]
    fn test_one_vote_per_voter() {
        let config = ProgramConfig {
            one_vote_per_voter: true,
            ..ProgramConfig::default()
        };
        let (ledger, processor) = setup_with(config, &["Japan", "Kyrgyztan"]);

        processor.cast_vote(&ledger, &at(voter(1), 5), 1, "Japan").unwrap();
        let before = ledger.snapshot().unwrap();

        let err = processor.cast_vote(&ledger, &at(voter(1), 6), 1, "Japan").unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        let err = processor.cast_vote(&ledger, &at(voter(1), 6), 1, "Kyrgyztan").unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(ledger.snapshot().unwrap(), before);

        processor.cast_vote(&ledger, &at(voter(2), 7), 1, "Japan").unwrap();
        assert_eq!(votes(&ledger, "Japan"), 2);
        assert_eq!(votes(&ledger, "Kyrgyztan"), 0);

        let receipt = ledger.read(&derive_receipt_key(1, &voter(1))).unwrap().unwrap();
        let receipt = VoteReceipt::decode(&receipt).unwrap();
        assert_eq!(receipt.candidate_name, "Japan");
        assert_eq!(receipt.voter, voter(1));
    }

    #[test]
    fn test_failed_transition_commits_nothing() {
        let config = ProgramConfig {
            one_vote_per_voter: true,
            ..ProgramConfig::default()
        };
        let (ledger, processor) = setup_with(config, &[]);
        let key = derive_candidate_key(1, "Japan").unwrap();
        ledger
            .apply(&[AccountMeta::writable(key)], &mut |accounts: &mut Accounts| {
                accounts.create(&key, &CandidateRecord {
                    poll_id: 1,
                    candidate_name: "Japan".into(),
                    candidate_votes: u64::MAX,
                })
            })
            .unwrap();
        let before = ledger.snapshot().unwrap();

        // The receipt is staged before the counter overflows.
        let err = processor.cast_vote(&ledger, &at(voter(1), 5), 1, "Japan").unwrap_err();
        assert_eq!(err.code, ErrorCode::SystemError);
        assert_eq!(ledger.snapshot().unwrap(), before);
        assert_eq!(ledger.read(&derive_receipt_key(1, &voter(1))).unwrap(), None);
        assert_eq!(votes(&ledger, "Japan"), u64::MAX);

        let other = derive_poll_key(99);
        let err = ledger
            .apply(&[AccountMeta::writable(other)], &mut |accounts: &mut Accounts| {
                accounts.create(&other, &PollRecord {
                    poll_id: 99,
                    description: String::new(),
                    poll_start: 0,
                    poll_end: 1,
                })?;
                Err(Error::system("boom"))
            })
            .unwrap_err();
        assert_eq!(err.message, "boom");
        assert_eq!(get_poll(&ledger, 99).unwrap(), None);
    }

    #[test]
    fn test_accounts_enforce_declared_access() {
        let poll_key = derive_poll_key(1);
        let candidate_key = derive_candidate_key(1, "Japan").unwrap();
        let poll = PollRecord {
            poll_id: 1,
            description: DESCRIPTION.into(),
            poll_start: 0,
            poll_end: POLL_END,
        };
        let loaded: HashMap<Key, Vec<u8>> = [(poll_key, poll.encode().unwrap())].into_iter().collect();
        let mut accounts = Accounts::from_snapshot(&[AccountMeta::readonly(poll_key)], loaded);

        assert_eq!(accounts.get::<PollRecord>(&poll_key).unwrap(), Some(poll.clone()));
        assert_eq!(accounts.get::<CandidateRecord>(&candidate_key).unwrap_err().code, ErrorCode::SystemError);
        assert_eq!(accounts.get::<CandidateRecord>(&poll_key).unwrap_err().code, ErrorCode::SystemError);

        let err = accounts
            .update(&poll_key, |p: &mut PollRecord| {
                p.poll_end = 1;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SystemError);
        assert!(accounts.into_writes().is_empty());
    }

    #[test]
    fn test_key_preimages() {
        let mut poll = POLL_TAG.to_vec();
        poll.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(poll_seed(1), poll);

        let mut candidate = CANDIDATE_TAG.to_vec();
        candidate.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);
        candidate.extend_from_slice(b"Japan");
        assert_eq!(candidate_seed(1, "Japan").unwrap(), candidate);

        let expected: [u8; 32] = Sha256::digest(&poll).into();
        assert_eq!(derive_poll_key(1).as_bytes(), &expected);
        let expected: [u8; 32] = Sha256::digest(&candidate).into();
        assert_eq!(derive_candidate_key(1, "Japan").unwrap().as_bytes(), &expected);
    }

    #[test]
    fn test_key_derivation_is_deterministic_and_separated() {
        assert_eq!(derive_poll_key(1), derive_poll_key(1));
        assert_ne!(derive_poll_key(1), derive_poll_key(2));
        assert_eq!(
            derive_candidate_key(1, "Japan").unwrap(),
            derive_candidate_key(1, "Japan").unwrap()
        );
        assert_ne!(
            derive_candidate_key(1, "Japan").unwrap(),
            derive_candidate_key(2, "Japan").unwrap()
        );
        assert_ne!(
            derive_candidate_key(1, "Japan").unwrap(),
            derive_candidate_key(1, "japan").unwrap()
        );
        assert_ne!(derive_receipt_key(1, &voter(1)), derive_receipt_key(1, &voter(2)));

        for (a, b) in [(POLL_TAG, CANDIDATE_TAG), (POLL_TAG, RECEIPT_TAG), (CANDIDATE_TAG, RECEIPT_TAG)] {
            assert!(!a.starts_with(b) && !b.starts_with(a));
        }
    }

    #[test]
    fn test_key_text_form() {
        let key = derive_candidate_key(1, "Japan").unwrap();
        let text = key.to_string();
        assert_eq!(text.len(), 43);
        assert_eq!(text.parse::<Key>().unwrap(), key);
        assert!(matches!("not a key".parse::<Key>(), Err(AddressError::InvalidEncoding(_))));
        assert!(matches!("AAAA".parse::<Key>(), Err(AddressError::InvalidEncoding(_))));

        let identity = voter(3);
        assert_eq!(identity.to_string().parse::<CallerIdentity>().unwrap(), identity);
        assert_eq!("short".parse::<CallerIdentity>().unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_instruction_shape() {
        let instruction = Instruction::CastVote {
            poll_id: 1,
            candidate_name: "Japan".into(),
        };
        assert_eq!(
            serde_json::to_value(&instruction).unwrap(),
            json!({ "method": "cast_vote", "pollId": 1, "candidateName": "Japan" })
        );

        let metas = instruction.accounts(&voter(1), &ProgramConfig::default()).unwrap();
        assert_eq!(
            metas,
            vec![
                AccountMeta::readonly(derive_poll_key(1)),
                AccountMeta::writable(derive_candidate_key(1, "Japan").unwrap()),
            ]
        );

        let config = ProgramConfig {
            one_vote_per_voter: true,
            ..ProgramConfig::default()
        };
        let metas = instruction.accounts(&voter(1), &config).unwrap();
        assert_eq!(metas.last(), Some(&AccountMeta::writable(derive_receipt_key(1, &voter(1)))));
    }

    #[test]
    fn test_record_encoding_is_tagged() {
        let candidate = CandidateRecord::new(1, "Japan");
        let bytes = candidate.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["kind"], "candidate");
        assert_eq!(value["candidateVotes"], 0);
        assert_eq!(PollRecord::decode(&bytes).unwrap_err().code, ErrorCode::SystemError);
        assert_eq!(CandidateRecord::decode(b"garbage").unwrap_err().code, ErrorCode::SystemError);
    }
}
