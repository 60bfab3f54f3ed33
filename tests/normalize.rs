#[cfg(test)]
mod tests {
    use dhtadmin::{
        metadata::{decode, DecodeError, Value, MAX_DEPTH},
        torrents::{normalize, File, FileLayout, InfoHash, ValidationError},
    };

    const ZERO_HASH: InfoHash = InfoHash([0; 20]);

    fn bytes(s: &str) -> Value {
        Value::Bytes(s.as_bytes().to_vec())
    }

    fn dict(entries: Vec<(&str, Value)>) -> Value {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.as_bytes().to_vec(), v)).collect())
    }

    fn file(path: &[&str], length: i64) -> Value {
        dict(vec![
            ("path", Value::List(path.iter().map(|s| bytes(s)).collect())),
            ("length", Value::Integer(length)),
        ])
    }

    #[test]
    fn can_decode_bencoded_info_dictionary() {
        let metadata = decode(b"d6:lengthi100e4:name5:a.txte").unwrap();

        assert_eq!(Some(&bytes("a.txt")), metadata.get("name"));
        assert_eq!(Some(&Value::Integer(100)), metadata.get("length"));
    }

    #[test]
    fn rejects_malformed_bytes() {
        assert!(matches!(decode(b"not bencode"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn rejects_integers_outside_i64() {
        let result = decode(b"d6:lengthi99999999999999999999999e4:name1:ae");
        assert!(matches!(result, Err(DecodeError::IntegerOverflow(_))));

        let result = decode(b"d6:lengthi-9223372036854775808e4:name1:ae");
        assert!(matches!(result, Err(DecodeError::IntegerOverflow(_))));
    }

    #[test]
    fn accepts_lengths_beyond_32_bits() {
        let metadata = decode(b"d6:lengthi1099511627776000e4:name1:ae").unwrap();

        assert_eq!(Some(&Value::Integer(1_099_511_627_776_000)), metadata.get("length"));
    }

    #[test]
    fn rejects_string_longer_than_input() {
        let result = decode(b"d4:name99999999999:ae");
        assert!(matches!(result, Err(DecodeError::Truncated(_))));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut nested = vec![b'd', b'1', b':', b'x'];
        nested.extend(std::iter::repeat(b'l').take(5000));
        nested.extend(std::iter::repeat(b'e').take(5001));

        assert!(matches!(decode(&nested), Err(DecodeError::TooDeep(MAX_DEPTH))));
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        let inner = MAX_DEPTH - 1;
        let mut nested = b"d5:extra".to_vec();
        nested.extend(std::iter::repeat(b'l').take(inner));
        nested.extend(std::iter::repeat(b'e').take(inner));
        nested.extend(b"6:lengthi1e4:name1:ae");

        assert!(decode(&nested).is_ok());
    }

    #[test]
    fn rejects_non_dictionary_top_level() {
        assert!(matches!(decode(b"i42e"), Err(DecodeError::NotADictionary)));
        assert!(matches!(decode(b"l4:spame"), Err(DecodeError::NotADictionary)));
    }

    #[test]
    fn can_normalize_single_file_torrent() {
        let metadata = dict(vec![("name", bytes("a.txt")), ("length", Value::Integer(100))]);

        let record = normalize(ZERO_HASH, &metadata).unwrap();

        assert_eq!("0".repeat(40), record.info_hash.to_string());
        assert_eq!("a.txt", record.name);
        assert_eq!(FileLayout::SingleFile { length: 100 }, record.layout);
        assert_eq!(Some(100), record.length());
        assert!(record.files().is_none());
    }

    #[test]
    fn can_normalize_multi_file_torrent_keeping_order() {
        let metadata = dict(vec![
            ("name", bytes("pack")),
            ("files", Value::List(vec![file(&["d", "f1"], 10), file(&["f2"], 20)])),
        ]);

        let record = normalize(ZERO_HASH, &metadata).unwrap();

        assert_eq!("pack", record.name);
        assert_eq!(
            Some(&[
                File { path: vec!["d".to_string(), "f1".to_string()], length: 10 },
                File { path: vec!["f2".to_string()], length: 20 },
            ][..]),
            record.files()
        );
        assert!(record.length().is_none());
        assert_eq!(30, record.total_size());
    }

    #[test]
    fn file_order_is_not_sorted() {
        let metadata = dict(vec![
            ("name", bytes("pack")),
            ("files", Value::List(vec![file(&["z"], 1), file(&["a", "c", "b"], 2)])),
        ]);

        let record = normalize(ZERO_HASH, &metadata).unwrap();
        let files = record.files().unwrap();

        assert_eq!(vec!["z"], files[0].path);
        assert_eq!(vec!["a", "c", "b"], files[1].path);
    }

    #[test]
    fn ignores_other_keys() {
        let metadata = dict(vec![
            ("name", bytes("a.txt")),
            ("length", Value::Integer(5)),
            ("piece length", Value::Integer(16384)),
            ("pieces", Value::Bytes(vec![0; 20])),
        ]);

        assert!(normalize(ZERO_HASH, &metadata).is_ok());
    }

    #[test]
    fn rejects_missing_name() {
        let metadata = dict(vec![("length", Value::Integer(100))]);

        assert_eq!(Err(ValidationError::MissingKey("name")), normalize(ZERO_HASH, &metadata));
    }

    #[test]
    fn rejects_non_string_and_empty_name() {
        let metadata = dict(vec![("name", Value::Integer(1)), ("length", Value::Integer(100))]);
        assert!(matches!(normalize(ZERO_HASH, &metadata), Err(ValidationError::WrongType { key: "name", .. })));

        let metadata = dict(vec![("name", bytes("")), ("length", Value::Integer(100))]);
        assert_eq!(Err(ValidationError::EmptyName), normalize(ZERO_HASH, &metadata));
    }

    #[test]
    fn rejects_both_files_and_length() {
        let metadata = dict(vec![
            ("name", bytes("pack")),
            ("length", Value::Integer(30)),
            ("files", Value::List(vec![file(&["f"], 30)])),
        ]);

        assert_eq!(Err(ValidationError::AmbiguousLayout), normalize(ZERO_HASH, &metadata));
    }

    #[test]
    fn rejects_neither_files_nor_length() {
        let metadata = dict(vec![("name", bytes("pack"))]);

        assert_eq!(Err(ValidationError::MissingLayout), normalize(ZERO_HASH, &metadata));
    }

    #[test]
    fn rejects_ill_shaped_file_entries() {
        let no_length = dict(vec![("path", Value::List(vec![bytes("f")]))]);
        let path_not_list = dict(vec![("path", bytes("f")), ("length", Value::Integer(1))]);
        let segment_not_string = dict(vec![
            ("path", Value::List(vec![Value::Integer(1)])),
            ("length", Value::Integer(1)),
        ]);

        for entry in [no_length, path_not_list, segment_not_string, bytes("f")] {
            let metadata = dict(vec![("name", bytes("pack")), ("files", Value::List(vec![entry]))]);
            assert!(normalize(ZERO_HASH, &metadata).is_err());
        }

        let metadata = dict(vec![("name", bytes("pack")), ("files", bytes("f"))]);
        assert!(matches!(normalize(ZERO_HASH, &metadata), Err(ValidationError::WrongType { key: "files", .. })));
    }

    #[test]
    fn rejects_empty_path_and_negative_length() {
        let metadata = dict(vec![("name", bytes("pack")), ("files", Value::List(vec![file(&[], 1)]))]);
        assert_eq!(Err(ValidationError::EmptyPath(0)), normalize(ZERO_HASH, &metadata));

        let metadata = dict(vec![("name", bytes("a")), ("length", Value::Integer(-1))]);
        assert_eq!(Err(ValidationError::NegativeLength(-1)), normalize(ZERO_HASH, &metadata));
    }

    #[test]
    fn single_file_document_has_no_files_key() {
        let metadata = decode(b"d6:lengthi100e4:name5:a.txte").unwrap();
        let record = normalize(ZERO_HASH, &metadata).unwrap();

        let document = serde_json::to_string(&record).unwrap();

        assert_eq!(
            format!(r#"{{"infohash":"{}","name":"a.txt","length":100}}"#, "0".repeat(40)),
            document
        );
    }

    #[test]
    fn multi_file_document_has_no_length_key() {
        let metadata = decode(
            b"d5:filesld6:lengthi10e4:pathl1:d2:f1eed6:lengthi20e4:pathl2:f2eee4:name4:packe",
        )
        .unwrap();
        let record = normalize(ZERO_HASH, &metadata).unwrap();

        let document: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert!(document.get("length").is_none());
        assert_eq!(
            serde_json::json!([
                {"path": ["d", "f1"], "length": 10},
                {"path": ["f2"], "length": 20}
            ]),
            document["files"]
        );
    }
}
