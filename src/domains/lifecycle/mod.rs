// Account lifecycle domain
// 계정 생명주기 도메인 (미인증 정리, 리마인더, 비활성 감지, 삭제)
pub mod models;
pub mod services;
