#![no_main]

use cfkv::{
    CfPrefix,
    column_family::{decode_key, encode_key, validate_cf_name},
};
use libfuzzer_sys::fuzz_target;

// Fuzz target for the column family key codec.
// First byte picks the family name length; the name is mapped onto [a-z].
fuzz_target!(|data: &[u8]| {
    let Some((&name_len, rest)) = data.split_first() else {
        return;
    };
    let name_len = (name_len as usize % 16).min(rest.len());
    let (name_bytes, key) = rest.split_at(name_len);

    let raw_name = String::from_utf8_lossy(name_bytes);
    if validate_cf_name(&raw_name).is_ok() {
        assert!(!raw_name.is_empty());
        assert!(!raw_name.contains('_'));
    }

    let name: String = name_bytes.iter().map(|b| (b'a' + b % 26) as char).collect();
    if name.is_empty() {
        assert!(CfPrefix::new(&name).is_err());
        return;
    }

    let prefix = CfPrefix::new(&name).unwrap();
    let physical = encode_key(&name, key);
    assert_eq!(physical, prefix.encode(key));
    assert!(prefix.covers(&physical));
    assert_eq!(decode_key(&physical, prefix.len()), key);

    // A key is never covered by the prefix of a shorter or longer name
    let shorter = &name[..name.len() - 1];
    if !shorter.is_empty() {
        assert!(!CfPrefix::new(shorter).unwrap().covers(&physical));
    }
    let longer = format!("{name}a");
    assert!(!CfPrefix::new(&longer).unwrap().covers(&physical));

    // Everything in the family sorts below the upper bound
    assert!(physical < prefix.upper_bound());
});
