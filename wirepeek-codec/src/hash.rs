pub fn md5_hex(input: &[u8]) -> String {
    format!("{:x}", md5::compute(input))
}
