/// 불투명 토큰 생성기
/// Opaque token generator
///
/// 역할:
/// - renew token / temp token 값 생성
/// - 32 바이트 난수를 URL-safe base64 로 인코딩 (패딩 없음, 43자)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// 토큰 엔트로피 (바이트)
/// Token entropy in bytes
pub const TOKEN_BYTES: usize = 32;

/// 새 불투명 토큰 생성
/// Generate a new opaque, URL-safe token
pub fn generate_unique_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
