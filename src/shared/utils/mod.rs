/// 공유 유틸리티 모듈
/// Shared Utilities Module
///
/// 역할:
/// - 불투명 토큰 생성기 (renew token, temp token)
pub mod token_generator;

pub use token_generator::*;
