use thiserror::Error;

/// 외부 서비스 호출 에러
/// Downstream (messaging / logging / study service) call failure
#[derive(Error, Debug)]
pub enum ClientError {
    /// 요청 전송 실패 (연결 불가 등)
    /// Request could not be delivered
    #[error("{service} unreachable: {source}")]
    Unavailable {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// 비정상 응답 코드
    /// Downstream answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// 테스트 / 비활성 클라이언트용
    /// Rejected without a network round trip
    #[error("{service} rejected request: {reason}")]
    Rejected {
        service: &'static str,
        reason: String,
    },
}
