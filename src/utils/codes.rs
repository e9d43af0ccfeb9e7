use rand::Rng;

/// Invite code alphabet: upper-case letters and digits without the
/// look-alikes I, O, 0 and 1.
pub const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const INVITE_CODE_LEN: usize = 12;

pub fn invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

/// Six digit delivery confirmation code.
pub fn otp_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
