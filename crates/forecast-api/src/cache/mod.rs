//! 예측 결과 캐시.
//!
//! 외부 시세 조회와 모델 학습 비용이 크므로 계산 결과를 일정 시간 재사용합니다.

mod forecast;

pub use forecast::{
    CacheError, CacheSettings, CacheState, CacheStatus, ForecastCache, RefreshError,
};
