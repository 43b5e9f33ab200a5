fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // Generated once here rather than as a const in the crate, so it is cached across compilations
    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let path = std::path::Path::new(&out_dir).join("hex.rs");
    let lookup_table = format!("{:?}", generate_hex_lookup_table());
    std::fs::write(&path, format!("pub const HEX_LOOKUP: [u8; u8::MAX as usize + 1] = {};\npub const INVALID_DIGIT: u8 = {};", lookup_table, INVALID_DIGIT)).unwrap();
}

// Any value above 0xF marks a byte which isn't a hex digit
const INVALID_DIGIT: u8 = 0xFF;

const fn generate_hex_lookup_table() -> [u8; u8::MAX as usize + 1] {
    let mut output = [INVALID_DIGIT; u8::MAX as usize + 1];
    let mut input: usize = 0;
    while input <= u8::MAX as usize {
        output[input] = map_hex_char(input as u8);
        input += 1;
    }
    output
}

const fn map_hex_char(input: u8) -> u8 {
    if input >= b'0' && input <= b'9' {
        input - b'0'
    } else if input >= b'A' && input <= b'F' {
        input - b'A' + 10
    } else if input >= b'a' && input <= b'f' {
        input - b'a' + 10
    } else {
        INVALID_DIGIT
    }
}
