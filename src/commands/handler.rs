//! Query Dispatch and Command Handlers
//!
//! This module is the query-execution core: it decodes the opcode at the
//! head of a request and routes it to one of the per-opcode handlers,
//! each of which parses its payload, consults or mutates the store, and
//! returns a [`Reply`] for the connection layer to deliver.
//!
//! ## Architecture
//!
//! ```text
//! request buffer
//!       │
//!       ▼
//! ┌─────────────────┐
//! │   dispatch()    │  opcode table: SET TTL GET DEL INC DEC END
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌─────────────────┐
//! │  set/ttl/get/   │─────>│     Store       │
//! │  del/incdec     │      │  (key index +   │
//! └────────┬────────┘      │   accounting)   │
//!          │               └─────────────────┘
//!          ▼
//!       Reply (code or value snapshot, close-after flag)
//! ```
//!
//! ## Execution model
//!
//! Handlers run to completion against a `&mut Store` with an explicit
//! `now` clock reading; commands are therefore naturally atomic with
//! respect to one another and fully deterministic under test.

use bytes::Bytes;

use crate::protocol::{
    bounded_key, parse_i64_exact, parse_request, split_key_rest, Opcode, ParseError, Reply,
    ReplyCode, ReplyValue,
};
use crate::storage::{Store, Value};

/// Decodes the opcode and routes the request to its handler.
///
/// `now` is the clock reading (unix seconds) the whole command executes
/// under. An unrecognized opcode fails fast without touching the store.
pub fn dispatch(store: &mut Store, now: u64, request: &[u8]) -> Result<Reply, ParseError> {
    let (opcode, payload) = parse_request(request)?;

    let reply = match opcode {
        Opcode::Set => set(store, now, payload),
        Opcode::Ttl => ttl(store, now, payload),
        Opcode::Get => get(store, now, payload),
        Opcode::Del => del(store, now, payload),
        Opcode::Inc => incdec(store, now, payload, 1),
        Opcode::Dec => incdec(store, now, payload, -1),
        Opcode::End => Reply::closing(ReplyCode::Ok),
    };

    Ok(reply)
}

/// Builds a VALUE reply from a stored value. Plain snapshots share the
/// item's buffer, so this never copies the stored bytes.
fn value_reply(value: &Value) -> Reply {
    match value {
        Value::Plain(buf) => Reply::value(ReplyValue::Plain(buf.clone())),
        Value::Number(n) => Reply::value(ReplyValue::Number(*n)),
    }
}

/// `SET key value` — stores a never-expiring Plain item.
///
/// The memory gate runs before anything is parsed: when the ceiling is
/// already exceeded the request is rejected outright and no existing
/// item is touched. Replacement of an occupied key is unconditional,
/// independent of the prior item's own TTL validity.
fn set(store: &mut Store, now: u64, payload: &[u8]) -> Reply {
    if !store.has_capacity() {
        return Reply::code(ReplyCode::OutOfMemory);
    }

    let max_key = store.config().max_key_size;
    let max_value = store.config().max_value_size;
    let (key, value) = split_key_rest(payload, max_key, max_value);

    let value = Value::Plain(Bytes::copy_from_slice(value));
    let snapshot = value.clone();
    store.insert(Bytes::copy_from_slice(key), value, -1, now);

    value_reply(&snapshot)
}

/// `TTL key seconds` — refreshes an item's expiry window.
///
/// The ttl string must be fully consumed by integer parsing; a partial
/// parse is a NotANumber error. A successful refresh resets the creation
/// timestamp, which makes any prior expiry state moot by construction —
/// this handler deliberately skips the validity check.
fn ttl(store: &mut Store, now: u64, payload: &[u8]) -> Reply {
    let max_key = store.config().max_key_size;
    let max_value = store.config().max_value_size;
    let max_item_ttl = store.config().max_item_ttl;
    let (key, ttl_bytes) = split_key_rest(payload, max_key, max_value);

    match store.find_mut(key) {
        Some(item) => match parse_i64_exact(ttl_bytes) {
            Some(requested) => {
                item.created_at = now;
                item.ttl = requested.min(max_item_ttl);
                Reply::code(ReplyCode::Ok)
            }
            None => Reply::code(ReplyCode::NotANumber),
        },
        None => Reply::code(ReplyCode::NotFound),
    }
}

/// `GET key` — the key is the entire remaining payload.
fn get(store: &mut Store, now: u64, payload: &[u8]) -> Reply {
    let key = bounded_key(payload, store.config().max_key_size);

    match store.find_valid(key, now) {
        Some(item) => value_reply(&item.value),
        None => Reply::code(ReplyCode::NotFound),
    }
}

/// `DEL key` — unconditionally removes the key.
///
/// The item is unlinked first, then classified: an item that had already
/// expired at the moment of removal reports NotFound even though the
/// delete itself succeeded and freed its memory. The destroy runs in
/// either case.
fn del(store: &mut Store, now: u64, payload: &[u8]) -> Reply {
    let key = bounded_key(payload, store.config().max_key_size);

    match store.remove(key) {
        Some(item) => {
            let was_valid = !item.is_expired(now);
            store.destroy(item);
            if was_valid {
                Reply::code(ReplyCode::Ok)
            } else {
                Reply::code(ReplyCode::NotFound)
            }
        }
        None => Reply::code(ReplyCode::NotFound),
    }
}

/// `INC key` / `DEC key` — counter arithmetic with delta ±1.
///
/// A missing key seeds a never-expiring Number item with the literal
/// value 1, whatever the direction. A Number item is updated in place
/// with no reallocation. A Plain item whose bytes parse fully as an
/// integer is converted in place to Number encoding; a non-numeric Plain
/// item is left untouched and reported as NotANumber.
fn incdec(store: &mut Store, now: u64, payload: &[u8], delta: i64) -> Reply {
    let key = bounded_key(payload, store.config().max_key_size);

    if !store.contains(key) {
        let value = Value::Number(1);
        let snapshot = value.clone();
        store.insert(Bytes::copy_from_slice(key), value, -1, now);
        return value_reply(&snapshot);
    }

    let parsed = match store.find_valid(key, now) {
        None => return Reply::code(ReplyCode::NotFound),
        Some(item) => match &mut item.value {
            Value::Number(n) => {
                let updated = n.wrapping_add(delta);
                *n = updated;
                return Reply::value(ReplyValue::Number(updated));
            }
            Value::Plain(buf) => parse_i64_exact(buf),
        },
    };

    match parsed {
        Some(num) => match store.convert_to_number(key, num.wrapping_add(delta)) {
            Some(value) => value_reply(&value),
            None => Reply::code(ReplyCode::NotFound),
        },
        None => Reply::code(ReplyCode::NotANumber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::opcode;
    use crate::protocol::ReplyBody;
    use crate::storage::{StoreConfig, ITEM_OVERHEAD, NUMBER_SIZE};

    fn request(op: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = op.to_le_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf
    }

    fn run(store: &mut Store, now: u64, op: u16, payload: &[u8]) -> Reply {
        dispatch(store, now, &request(op, payload)).unwrap()
    }

    fn plain(data: &'static [u8]) -> Reply {
        Reply::value(ReplyValue::Plain(Bytes::from_static(data)))
    }

    fn number(n: i64) -> Reply {
        Reply::value(ReplyValue::Number(n))
    }

    fn code(c: ReplyCode) -> Reply {
        Reply::code(c)
    }

    #[test]
    fn set_then_get_returns_value_unchanged() {
        let mut store = Store::default();

        assert_eq!(run(&mut store, 100, opcode::SET, b"foo bar"), plain(b"bar"));
        assert_eq!(run(&mut store, 100, opcode::GET, b"foo"), plain(b"bar"));
    }

    #[test]
    fn set_value_may_contain_spaces() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k one two three");
        assert_eq!(
            run(&mut store, 100, opcode::GET, b"k"),
            plain(b"one two three")
        );
    }

    #[test]
    fn set_overwrite_frees_old_memory_before_charging_new() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k aaaaaaaaaa"); // 10 bytes
        run(&mut store, 101, opcode::SET, b"k bb"); // 2 bytes

        assert_eq!(store.item_count(), 1);
        assert_eq!(store.memory_used(), (2 + ITEM_OVERHEAD) as u64);
        assert_eq!(run(&mut store, 101, opcode::GET, b"k"), plain(b"bb"));
    }

    #[test]
    fn set_replaces_even_an_expired_item() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k old");
        run(&mut store, 100, opcode::TTL, b"k 1");
        // Long past expiry; Set must replace without consulting validity.
        assert_eq!(run(&mut store, 500, opcode::SET, b"k new"), plain(b"new"));
        assert_eq!(run(&mut store, 500, opcode::GET, b"k"), plain(b"new"));
        assert_eq!(store.item_count(), 1);
    }

    #[test]
    fn set_rejected_at_ceiling_without_mutation() {
        let mut store = Store::new(StoreConfig {
            memory_ceiling: (ITEM_OVERHEAD + 3) as u64,
            ..StoreConfig::default()
        });

        run(&mut store, 100, opcode::SET, b"a aaa");
        run(&mut store, 100, opcode::SET, b"b bbb"); // pushes usage past the ceiling
        let before = store.memory_used();

        assert_eq!(
            run(&mut store, 101, opcode::SET, b"x 1"),
            code(ReplyCode::OutOfMemory)
        );
        assert_eq!(store.memory_used(), before);
        assert_eq!(run(&mut store, 101, opcode::GET, b"x"), code(ReplyCode::NotFound));
        // Pre-existing items are untouched.
        assert_eq!(run(&mut store, 101, opcode::GET, b"a"), plain(b"aaa"));
    }

    #[test]
    fn set_truncates_key_and_value_to_bounds() {
        let mut store = Store::new(StoreConfig {
            max_key_size: 4,
            max_value_size: 3,
            ..StoreConfig::default()
        });

        // Key cut at 4 bytes, one byte skipped as the delimiter slot,
        // value cut at 3 bytes.
        assert_eq!(
            run(&mut store, 100, opcode::SET, b"abcdefgh"),
            plain(b"fgh")
        );
        assert_eq!(run(&mut store, 100, opcode::GET, b"abcd"), plain(b"fgh"));
    }

    #[test]
    fn get_missing_key_is_not_found() {
        let mut store = Store::default();
        assert_eq!(run(&mut store, 100, opcode::GET, b"nope"), code(ReplyCode::NotFound));
    }

    #[test]
    fn ttl_expiry_is_discovered_by_the_failing_get() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"foo bar");
        assert_eq!(run(&mut store, 100, opcode::TTL, b"foo 5"), code(ReplyCode::Ok));

        // Valid up to exactly 5 seconds after the refresh.
        assert_eq!(run(&mut store, 105, opcode::GET, b"foo"), plain(b"bar"));
        // Strictly after: not found, and the key is reaped as a side effect.
        assert_eq!(run(&mut store, 106, opcode::GET, b"foo"), code(ReplyCode::NotFound));
        assert!(!store.contains(b"foo"));
        assert_eq!(store.memory_used(), 0);
    }

    #[test]
    fn ttl_refresh_restarts_the_window() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k v");
        run(&mut store, 100, opcode::TTL, b"k 5");
        // Refresh at 104 pushes expiry out to 109.
        assert_eq!(run(&mut store, 104, opcode::TTL, b"k 5"), code(ReplyCode::Ok));
        assert_eq!(run(&mut store, 108, opcode::GET, b"k"), plain(b"v"));
        assert_eq!(run(&mut store, 110, opcode::GET, b"k"), code(ReplyCode::NotFound));
    }

    #[test]
    fn ttl_zero_and_negative_never_expire() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"a 1");
        run(&mut store, 100, opcode::SET, b"b 2");
        run(&mut store, 100, opcode::TTL, b"a 0");
        run(&mut store, 100, opcode::TTL, b"b -3");

        assert_eq!(run(&mut store, u64::MAX, opcode::GET, b"a"), plain(b"1"));
        assert_eq!(run(&mut store, u64::MAX, opcode::GET, b"b"), plain(b"2"));
    }

    #[test]
    fn ttl_is_clamped_to_the_configured_maximum() {
        let mut store = Store::new(StoreConfig {
            max_item_ttl: 10,
            ..StoreConfig::default()
        });

        run(&mut store, 100, opcode::SET, b"k v");
        run(&mut store, 100, opcode::TTL, b"k 99999");

        assert_eq!(run(&mut store, 110, opcode::GET, b"k"), plain(b"v"));
        assert_eq!(run(&mut store, 111, opcode::GET, b"k"), code(ReplyCode::NotFound));
    }

    #[test]
    fn ttl_rejects_partial_integer_parses() {
        let mut store = Store::default();
        run(&mut store, 100, opcode::SET, b"k v");

        assert_eq!(
            run(&mut store, 100, opcode::TTL, b"k 12x"),
            code(ReplyCode::NotANumber)
        );
        // The item is unchanged and still never expires.
        assert_eq!(run(&mut store, u64::MAX, opcode::GET, b"k"), plain(b"v"));
    }

    #[test]
    fn ttl_on_missing_key_reports_not_found_even_for_bad_numbers() {
        let mut store = Store::default();
        // Lookup runs first, so the missing key wins over the parse error.
        assert_eq!(
            run(&mut store, 100, opcode::TTL, b"ghost nan"),
            code(ReplyCode::NotFound)
        );
    }

    #[test]
    fn ttl_does_not_consult_validity_before_refreshing() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k v");
        run(&mut store, 100, opcode::TTL, b"k 5");
        // The item is long expired, but the refresh resets created_at and
        // revives it; that is the documented contract.
        assert_eq!(run(&mut store, 500, opcode::TTL, b"k 5"), code(ReplyCode::Ok));
        assert_eq!(run(&mut store, 505, opcode::GET, b"k"), plain(b"v"));
    }

    #[test]
    fn del_present_key_then_repeat() {
        let mut store = Store::default();
        run(&mut store, 100, opcode::SET, b"counter 1");

        assert_eq!(run(&mut store, 100, opcode::DEL, b"counter"), code(ReplyCode::Ok));
        assert_eq!(store.item_count(), 0);
        assert_eq!(
            run(&mut store, 100, opcode::DEL, b"counter"),
            code(ReplyCode::NotFound)
        );
    }

    #[test]
    fn del_expired_key_frees_memory_but_reports_not_found() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k v");
        run(&mut store, 100, opcode::TTL, b"k 1");

        assert_eq!(run(&mut store, 200, opcode::DEL, b"k"), code(ReplyCode::NotFound));
        // The delete still happened: the key is gone and the counters are back.
        assert!(!store.contains(b"k"));
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.memory_used(), 0);
    }

    #[test]
    fn inc_on_missing_key_seeds_literal_one() {
        let mut store = Store::default();
        assert_eq!(run(&mut store, 100, opcode::INC, b"counter"), number(1));
    }

    #[test]
    fn dec_on_missing_key_also_seeds_literal_one() {
        let mut store = Store::default();
        // The seed ignores the direction; this is the observed contract.
        assert_eq!(run(&mut store, 100, opcode::DEC, b"counter"), number(1));
    }

    #[test]
    fn inc_and_dec_update_a_number_in_place() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::INC, b"c"); // seeds 1
        assert_eq!(run(&mut store, 100, opcode::INC, b"c"), number(2));
        assert_eq!(run(&mut store, 100, opcode::INC, b"c"), number(3));
        assert_eq!(run(&mut store, 100, opcode::DEC, b"c"), number(2));

        let item = store.find_mut(b"c").unwrap();
        assert_eq!(item.size, NUMBER_SIZE);
        assert!(matches!(item.value, Value::Number(2)));
    }

    #[test]
    fn inc_converts_numeric_plain_to_number() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"counter 10");
        let before = store.memory_used();

        assert_eq!(run(&mut store, 100, opcode::INC, b"counter"), number(11));

        // The 2-byte buffer was traded for the 8-byte inline integer.
        assert_eq!(store.memory_used(), before - 2 + NUMBER_SIZE as u64);
        let item = store.find_mut(b"counter").unwrap();
        assert!(matches!(item.value, Value::Number(11)));
        assert_eq!(item.size, NUMBER_SIZE);
    }

    #[test]
    fn dec_converts_negative_numeric_plain() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"c -5");
        assert_eq!(run(&mut store, 100, opcode::DEC, b"c"), number(-6));
    }

    #[test]
    fn incdec_on_non_numeric_plain_is_rejected_unchanged() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k hello");
        let before = store.memory_used();

        assert_eq!(run(&mut store, 100, opcode::INC, b"k"), code(ReplyCode::NotANumber));
        assert_eq!(run(&mut store, 100, opcode::DEC, b"k"), code(ReplyCode::NotANumber));

        assert_eq!(store.memory_used(), before);
        assert_eq!(run(&mut store, 100, opcode::GET, b"k"), plain(b"hello"));
    }

    #[test]
    fn incdec_rejects_partial_numeric_plain() {
        let mut store = Store::default();
        run(&mut store, 100, opcode::SET, b"k 12x");
        assert_eq!(run(&mut store, 100, opcode::INC, b"k"), code(ReplyCode::NotANumber));
    }

    #[test]
    fn inc_on_expired_key_is_not_found_and_reaps() {
        let mut store = Store::default();

        run(&mut store, 100, opcode::SET, b"k 10");
        run(&mut store, 100, opcode::TTL, b"k 1");

        assert_eq!(run(&mut store, 200, opcode::INC, b"k"), code(ReplyCode::NotFound));
        assert!(!store.contains(b"k"));
        // The next INC sees a missing key and seeds 1.
        assert_eq!(run(&mut store, 200, opcode::INC, b"k"), number(1));
    }

    #[test]
    fn end_replies_ok_and_asks_to_close() {
        let mut store = Store::default();
        let reply = run(&mut store, 100, opcode::END, b"");

        assert_eq!(reply.body, ReplyBody::Code(ReplyCode::Ok));
        assert!(reply.close_after);
    }

    #[test]
    fn unknown_opcode_fails_fast_without_touching_the_store() {
        let mut store = Store::default();
        run(&mut store, 100, opcode::SET, b"k v");
        let before = store.memory_used();

        let err = dispatch(&mut store, 100, &request(0x99, b"k v")).unwrap_err();
        assert_eq!(err, ParseError::UnknownOpcode(0x99));
        assert_eq!(store.memory_used(), before);
        assert_eq!(store.item_count(), 1);
    }
}
