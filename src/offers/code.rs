use rand::Rng;

pub const CODE_PREFIX: &str = "EYESITE";
pub const SUFFIX_LEN: usize = 6;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Candidate offer code: the fixed prefix plus six random base-36 characters.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(CODE_PREFIX.len() + SUFFIX_LEN);
    code.push_str(CODE_PREFIX);
    for _ in 0..SUFFIX_LEN {
        code.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
    }
    code
}

/// Normalizes user-typed codes for lookup.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}
