//! End-to-end conversions through the platform iconv

use std::io::{self, Read};

use proptest::prelude::*;
use stream_iconv::{ConversionOption, Converter, Error, OverflowPolicy, PumpConfig};

/// Serves the data in reads of the given sizes, then whatever fits
struct Chunked<'a> {
    data: &'a [u8],
    sizes: std::vec::IntoIter<usize>,
}

impl<'a> Chunked<'a> {
    fn new(data: &'a [u8], sizes: &[usize]) -> Self {
        Self {
            data,
            sizes: sizes.to_vec().into_iter(),
        }
    }
}

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = self.sizes.next().unwrap_or(usize::MAX);
        let n = want.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn convert(to: &str, from: &str, input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut converter = Converter::open(to, from, ConversionOption::None)?;
    let mut sink = Vec::new();
    converter.execute(&mut sink, &mut &input[..])?;
    Ok(sink)
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

fn convert_retrying(to: &str, from: &str, input: &[u8]) -> Result<Vec<u8>, Error> {
    let config = PumpConfig::new().on_overflow(OverflowPolicy::FlushAndRetry);
    let mut converter = Converter::open(to, from, ConversionOption::None)?.with_config(config)?;
    let mut sink = Vec::new();
    converter.execute(&mut sink, &mut &input[..])?;
    Ok(sink)
}

proptest! {
    #[test]
    fn ascii_round_trip(text in "[ -~\t\r\n]{0,10000}") {
        for via in ["UTF-16LE", "UTF-32LE", "UTF-16BE"] {
            let forward = convert_retrying(via, "UTF-8", text.as_bytes()).unwrap();
            let back = convert_retrying("UTF-8", via, &forward).unwrap();
            prop_assert_eq!(&back, text.as_bytes());
        }
    }
}

#[test]
fn test_empty_source_writes_nothing() {
    let mut converter = Converter::open("UTF-16LE", "UTF-8", ConversionOption::None).unwrap();
    let mut sink = Vec::new();

    let summary = converter.execute(&mut sink, &mut io::empty()).unwrap();

    assert!(sink.is_empty());
    assert_eq!(summary.bytes_read, 0);
    assert_eq!(summary.bytes_written, 0);
}

#[test]
fn test_split_sequence_matches_whole_delivery() {
    let text = "price: 5€";
    let bytes = text.as_bytes();
    // Cut after the first byte of the three-byte euro sign, then after the second
    let cut = bytes.len() - 2;

    let mut converter = Converter::open("UTF-16LE", "UTF-8", ConversionOption::None).unwrap();
    let mut split = Vec::new();
    converter
        .execute(&mut split, &mut Chunked::new(bytes, &[cut, 1, 1]))
        .unwrap();
    let mut whole = Vec::new();
    converter
        .execute(&mut whole, &mut Chunked::new(bytes, &[bytes.len()]))
        .unwrap();

    assert_eq!(split, whole);
    assert_eq!(split, utf16le(text));
}

#[test]
fn test_large_multibyte_stream_with_small_buffers() {
    let text = "日本語のテキスト, ελληνικά, русский; ".repeat(500);
    let config = PumpConfig::new().read_capacity(17).write_capacity(128);
    let mut converter = Converter::open("UTF-32LE", "UTF-8", ConversionOption::None)
        .unwrap()
        .with_config(config)
        .unwrap();

    let mut sink = Vec::new();
    let summary = converter.execute(&mut sink, &mut text.as_bytes()).unwrap();

    let expected: Vec<u8> = text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect();
    assert_eq!(sink, expected);
    assert_eq!(summary.bytes_read, text.len() as u64);
}

#[test]
fn test_invalid_sequence() {
    let input = b"valid \xFF\xFE rest";
    let mut converter = Converter::open("UTF-16LE", "UTF-8", ConversionOption::None).unwrap();
    let mut sink = Vec::new();

    let err = converter
        .execute(&mut sink, &mut Chunked::new(input, &[6, 100]))
        .unwrap_err();

    assert!(matches!(err, Error::InvalidSequence { offset: 6 }));
    assert_eq!(sink, utf16le("valid "));
}

#[test]
fn test_truncated_input_is_incomplete() {
    let err = convert("UTF-16LE", "UTF-8", b"ab\xE2\x82").unwrap_err();
    assert!(matches!(err, Error::IncompleteSequence { offset: 2 }));
}

#[test]
fn test_expanding_chunk_overflows_output() {
    // 4096 ASCII bytes become 16384 bytes of UTF-32, twice the write buffer
    let input = vec![b'a'; 4096];
    let err = convert("UTF-32LE", "UTF-8", &input).unwrap_err();

    assert!(matches!(err, Error::OutputBufferFull { .. }));
}

#[test]
fn test_expanding_chunk_with_flush_and_retry() {
    let input = vec![b'a'; 4096];
    let config = PumpConfig::new().on_overflow(OverflowPolicy::FlushAndRetry);
    let mut converter = Converter::open("UTF-32LE", "UTF-8", ConversionOption::None)
        .unwrap()
        .with_config(config)
        .unwrap();

    let mut sink = Vec::new();
    let summary = converter.execute(&mut sink, &mut &input[..]).unwrap();

    assert_eq!(summary.bytes_written, 16384);
    assert_eq!(&sink[..8], &[b'a', 0, 0, 0, b'a', 0, 0, 0]);
}

#[test]
fn test_unknown_encoding_fails_to_open() {
    let err = Converter::open("UTF-8", "NO-SUCH-ENCODING", ConversionOption::None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConversion { .. }));

    let err = Converter::open("NO-SUCH-ENCODING", "UTF-8", ConversionOption::None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConversion { .. }));
}

#[test]
fn test_close_is_idempotent() {
    let mut converter = Converter::open("UTF-8", "UTF-16LE", ConversionOption::None).unwrap();
    converter.close();
    converter.close();
    assert!(!converter.is_open());

    let err = converter
        .execute(&mut Vec::<u8>::new(), &mut &b"x"[..])
        .unwrap_err();
    assert!(matches!(err, Error::Closed));
}

#[test]
fn test_ignore_option_is_accepted() {
    let mut converter = Converter::open("UTF-16LE", "UTF-8", ConversionOption::Ignore).unwrap();
    let mut sink = Vec::new();
    converter.execute(&mut sink, &mut "plain".as_bytes()).unwrap();
    assert_eq!(sink, utf16le("plain"));
}

#[test]
fn test_ignore_option_drops_unrepresentable() {
    let text = "héllo wörld";
    let mut converter = Converter::open("ASCII", "UTF-8", ConversionOption::Ignore).unwrap();
    let mut sink = Vec::new();

    let summary = converter.execute(&mut sink, &mut text.as_bytes()).unwrap();

    assert_eq!(sink, b"hllo wrld");
    assert_eq!(summary.bytes_read, text.len() as u64);
    assert_eq!(summary.bytes_written, 9);
}

#[test]
fn test_unrepresentable_without_option_is_invalid() {
    let mut converter = Converter::open("ASCII", "UTF-8", ConversionOption::None).unwrap();
    let mut sink = Vec::new();

    let err = converter
        .execute(&mut sink, &mut "héllo".as_bytes())
        .unwrap_err();

    assert!(matches!(err, Error::InvalidSequence { offset: 1 }));
}

#[test]
fn test_transliteration_option_substitutes_ascii() {
    let mut converter =
        Converter::open("ASCII", "UTF-8", ConversionOption::Transliteration).unwrap();
    let mut sink = Vec::new();

    converter.execute(&mut sink, &mut "€".as_bytes()).unwrap();

    assert!(!sink.is_empty());
    assert!(sink.is_ascii());
}
