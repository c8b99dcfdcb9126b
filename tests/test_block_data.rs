//! Tests for the [`BlockData`] assembler.
//!
//! The block data format is fragmentation-agnostic: however a frame is split across reads, the
//! assembled result must be the same. Most tests here feed the same frame in different shapes.

use rstest::*;

use scpibus::BlockData;

/// A complete frame: `#3120` header followed by 120 payload bytes of `0x41`.
#[fixture]
fn frame_bytes() -> Vec<u8> {
    let mut frame = b"#3120".to_vec();
    frame.extend_from_slice(&[0x41; 120]);
    frame
}

#[rstest]
fn complete_frame_in_one_push(frame_bytes: Vec<u8>) {
    let mut block = BlockData::new();
    block.push_back(frame_bytes);

    assert!(!block.header_error());
    assert!(block.is_header());
    assert!(block.is_complete());
    assert_eq!(block.payload_size(), 120);
    assert_eq!(block.payload(), &[0x41; 120][..]);
}

#[rstest]
fn complete_frame_from_initial_data(frame_bytes: Vec<u8>) {
    let block = BlockData::from_data(frame_bytes);

    assert!(block.is_complete());
    assert_eq!(block.payload_size(), 120);
}

/// Feeding the frame in chunks of any size must end in the same state as one single push.
#[rstest]
#[case::byte_at_a_time(1)]
#[case::pairs(2)]
#[case::mid_header_splits(3)]
#[case::large_chunks(64)]
fn chunking_does_not_change_the_result(frame_bytes: Vec<u8>, #[case] chunk_size: usize) {
    let mut block = BlockData::new();
    for chunk in frame_bytes.chunks(chunk_size) {
        block.push_back(chunk);
    }

    assert!(block.is_complete());
    assert_eq!(block.payload_size(), 120);
    assert_eq!(block.payload(), &[0x41; 120][..]);
}

/// The header is parsed exactly when all `2 + d` header bytes are there, not before.
#[rstest]
fn header_requires_all_size_digits() {
    let mut block = BlockData::new();
    block.push_back(b"#".as_slice());
    assert!(!block.is_header());
    assert!(!block.header_error());

    block.push_back(b"3".as_slice());
    assert!(!block.is_header());

    block.push_back(b"12".as_slice());
    assert!(!block.is_header());

    block.push_back(b"0".as_slice());
    assert!(block.is_header());
    assert_eq!(block.payload_size(), 120);
    assert!(!block.is_complete());
}

/// The frame is complete exactly when the declared payload byte count has arrived.
#[rstest]
fn completeness_requires_the_full_payload(frame_bytes: Vec<u8>) {
    let (head, tail) = frame_bytes.split_at(frame_bytes.len() - 1);

    let mut block = BlockData::new();
    block.push_back(head);
    assert!(block.is_header());
    assert!(!block.is_complete());
    assert_eq!(block.bytes_remaining(), 1);

    block.push_back(tail);
    assert!(block.is_complete());
    assert_eq!(block.bytes_remaining(), 0);
}

/// A wrong magic byte is detected immediately and is permanent for the frame.
#[rstest]
fn wrong_magic_byte_is_a_permanent_error() {
    let mut block = BlockData::new();
    block.push_back(b"X".as_slice());
    assert!(block.header_error());

    block.push_back(b"3120".as_slice());
    block.push_back(vec![0x41; 120]);
    assert!(block.header_error());
    assert!(!block.is_header());
    assert!(!block.is_complete());
}

/// A non-digit inside the size field is detected as soon as the offending byte arrives.
#[rstest]
fn non_digit_size_field_is_an_error() {
    let mut block = BlockData::new();
    block.push_back(b"#3".as_slice());
    assert!(!block.header_error());

    block.push_back(b"0A".as_slice());
    assert!(block.header_error());
}

#[rstest]
#[case::empty(b"".to_vec(), false)]
#[case::magic_only(b"#".to_vec(), false)]
#[case::magic_and_count(b"#9".to_vec(), false)]
#[case::partial_digits(b"#3089".to_vec(), false)]
#[case::zero_digit_count(b"#0".to_vec(), true)]
#[case::count_not_a_digit(b"#x".to_vec(), true)]
fn header_error_on_prefixes(#[case] prefix: Vec<u8>, #[case] expected: bool) {
    let block = BlockData::from_data(prefix);
    assert_eq!(block.header_error(), expected);
}

/// Bytes past the declared end of the frame are dropped, the frame never grows beyond the
/// declared block size.
#[rstest]
fn excess_bytes_after_header_are_dropped() {
    let mut block = BlockData::new();
    block.push_back(b"#15AA".as_slice());
    assert!(block.is_header());

    block.push_back(b"AAABBBB".as_slice());
    assert!(block.is_complete());
    assert_eq!(block.payload(), b"AAAAA");
    assert_eq!(block.raw().len(), 8);
}

/// Excess delivered in the same chunk as the header still caps the payload at the declared
/// size.
#[rstest]
fn excess_bytes_with_header_do_not_leak_into_payload() {
    let block = BlockData::from_data(b"#13abcXYZ".to_vec());

    assert!(block.is_complete());
    assert_eq!(block.payload_size(), 3);
    assert_eq!(block.payload(), b"abc");
}

#[rstest]
fn push_back_after_complete_is_a_no_op(frame_bytes: Vec<u8>) {
    let mut block = BlockData::from_data(frame_bytes);
    assert!(block.is_complete());

    block.push_back(b"#15AAAAA".as_slice());
    assert_eq!(block.payload_size(), 120);
    assert_eq!(block.raw().len(), 125);
}

#[rstest]
fn accessors_before_header_are_empty() {
    let block = BlockData::from_data(b"#412".to_vec());

    assert_eq!(block.payload_size(), 0);
    assert!(block.payload().is_empty());
    assert_eq!(block.bytes_remaining(), 0);
    assert_eq!(block.raw(), b"#412");
}

#[rstest]
fn into_payload_returns_owned_payload(frame_bytes: Vec<u8>) {
    let block = BlockData::from_data(frame_bytes);
    assert_eq!(block.into_payload(), vec![0x41; 120]);
}

#[rstest]
fn into_payload_without_header_is_empty() {
    let block = BlockData::from_data(b"#3".to_vec());
    assert!(block.into_payload().is_empty());
}

/// A zero-length payload (`#10`) is a valid block that is complete with the header alone.
#[rstest]
fn zero_length_payload_is_complete() {
    let block = BlockData::from_data(b"#10".to_vec());

    assert!(block.is_header());
    assert!(block.is_complete());
    assert_eq!(block.payload_size(), 0);
    assert!(block.payload().is_empty());
}
