//! Credential hashing properties.

use workdesk::auth::PasswordDigest;
use workdesk::error::Error;

#[test]
fn derive_then_verify_succeeds() {
    let (hash, salt) = PasswordDigest::derive("correct horse battery staple").unwrap();
    assert!(PasswordDigest::verify("correct horse battery staple", &hash, &salt).unwrap());
}

#[test]
fn verify_rejects_wrong_password() {
    let (hash, salt) = PasswordDigest::derive("correct horse battery staple").unwrap();
    assert!(!PasswordDigest::verify("tr0ub4dor&3", &hash, &salt).unwrap());
}

#[test]
fn fresh_salt_per_derivation() {
    let (h1, s1) = PasswordDigest::derive("hunter2").unwrap();
    let (h2, s2) = PasswordDigest::derive("hunter2").unwrap();
    assert_ne!(s1, s2);
    assert_ne!(h1, h2);
}

#[test]
fn fixed_length_outputs() {
    let (hash, salt) = PasswordDigest::derive("hunter2").unwrap();
    assert_eq!(hash.len(), 32);
    assert_eq!(salt.len(), 32);
}

#[test]
fn missing_inputs_are_invalid() {
    assert!(matches!(
        PasswordDigest::derive(""),
        Err(Error::InvalidInput(_))
    ));

    let (hash, salt) = PasswordDigest::derive("x").unwrap();
    assert!(matches!(
        PasswordDigest::verify("", &hash, &salt),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        PasswordDigest::verify("x", &[], &salt),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        PasswordDigest::verify("x", &hash, &[]),
        Err(Error::InvalidInput(_))
    ));
}
