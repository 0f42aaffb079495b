//! Per-client sliding-window request limiter.

use std::{
    collections::{HashMap, VecDeque},
    future::{ready, Ready},
    net::IpAddr,
    rc::Rc,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap, HeaderName, HeaderValue},
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;

const LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

// Stale clients are swept once the table reaches this size.
const SWEEP_THRESHOLD: usize = 10_000;

pub const RATELIMIT_POLICY: &str = "ratelimit-policy";
pub const RATELIMIT_LIMIT: &str = "ratelimit-limit";
pub const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
pub const RATELIMIT_RESET: &str = "ratelimit-reset";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Allowed { remaining: usize, reset: Duration },
    Limited { retry_after: Duration },
}

/// Timestamps of admitted requests per client, trimmed to the window.
pub struct SlidingWindow {
    window: Duration,
    max_requests: usize,
    table: Mutex<HitTable>,
}

struct HitTable {
    clients: HashMap<Option<IpAddr>, VecDeque<Instant>>,
    sweep_at: usize,
}

impl HitTable {
    fn sweep(&mut self, window: Duration, now: Instant) {
        self.clients.retain(|_, hits| {
            hits.back()
                .is_some_and(|last| now.saturating_duration_since(*last) < window)
        });

        // next sweep once the surviving clients have doubled
        self.sweep_at = SWEEP_THRESHOLD.max(self.clients.len() * 2);
    }
}

impl SlidingWindow {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        SlidingWindow {
            window,
            max_requests,
            table: Mutex::new(HitTable {
                clients: HashMap::new(),
                sweep_at: SWEEP_THRESHOLD,
            }),
        }
    }

    pub fn check(&self, client: Option<IpAddr>, now: Instant) -> Decision {
        let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if table.clients.len() >= table.sweep_at {
            table.sweep(self.window, now);
        }

        let hits = table.clients.entry(client).or_default();

        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.max_requests {
            return Decision::Limited {
                retry_after: self.until_expiry(hits.front().copied(), now),
            };
        }

        hits.push_back(now);

        Decision::Allowed {
            remaining: self.max_requests - hits.len(),
            reset: self.until_expiry(hits.front().copied(), now),
        }
    }

    fn until_expiry(&self, oldest: Option<Instant>, now: Instant) -> Duration {
        match oldest {
            Some(oldest) => self
                .window
                .saturating_sub(now.saturating_duration_since(oldest)),
            None => self.window,
        }
    }

    fn policy(&self) -> String {
        format!("{};w={}", self.max_requests, self.window.as_secs())
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.table.lock().unwrap().clients.len()
    }

    #[cfg(test)]
    fn sweep_at(&self) -> usize {
        self.table.lock().unwrap().sweep_at
    }
}

/// Middleware factory. Clones share one hit table, so a single instance
/// limits across all workers.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<SlidingWindow>,
}

impl RateLimit {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        RateLimit {
            limiter: Arc::new(SlidingWindow::new(window, max_requests)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<SlidingWindow>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = req.peer_addr().map(|addr| addr.ip());
        let decision = self.limiter.check(client, Instant::now());
        let policy = self.limiter.policy();
        let limit = self.limiter.max_requests;

        match decision {
            Decision::Limited { retry_after } => {
                tracing::warn!(client = ?client, path = req.path(), "rate limit exceeded");

                let mut response = HttpResponse::TooManyRequests()
                    .insert_header((header::RETRY_AFTER, ceil_secs(retry_after)))
                    .content_type("text/plain; charset=utf-8")
                    .body(LIMITED_MESSAGE);

                insert_headers(response.headers_mut(), &policy, limit, 0, retry_after);

                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            }

            Decision::Allowed { remaining, reset } => {
                let fut = self.service.call(req);

                Box::pin(async move {
                    let mut res = fut.await?;

                    insert_headers(res.headers_mut(), &policy, limit, remaining, reset);

                    Ok(res.map_into_left_body())
                })
            }
        }
    }
}

fn insert_headers(
    headers: &mut HeaderMap,
    policy: &str,
    limit: usize,
    remaining: usize,
    reset: Duration,
) {
    let values = [
        (RATELIMIT_POLICY, policy.to_string()),
        (RATELIMIT_LIMIT, limit.to_string()),
        (RATELIMIT_REMAINING, remaining.to_string()),
        (RATELIMIT_RESET, ceil_secs(reset).to_string()),
    ];

    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        http::StatusCode,
        test::{call_service, init_service, read_body, TestRequest},
        web, App,
    };

    fn ip(last: u8) -> Option<IpAddr> {
        Some(IpAddr::from([10, 0, 0, last]))
    }

    #[test]
    fn admits_up_to_max_then_limits() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 3);
        let start = Instant::now();

        for expected in [2, 1, 0] {
            match limiter.check(ip(1), start) {
                Decision::Allowed { remaining, .. } => assert_eq!(remaining, expected),
                other => panic!("unexpected {other:?}"),
            }
        }

        assert_eq!(
            limiter.check(ip(1), start + Duration::from_secs(10)),
            Decision::Limited {
                retry_after: Duration::from_secs(50)
            }
        );
    }

    #[test]
    fn clients_are_independent() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 1);
        let now = Instant::now();

        assert!(matches!(limiter.check(ip(1), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check(ip(1), now), Decision::Limited { .. }));
        assert!(matches!(limiter.check(ip(2), now), Decision::Allowed { .. }));
    }

    #[test]
    fn window_slides() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 2);
        let start = Instant::now();

        limiter.check(ip(1), start);
        limiter.check(ip(1), start + Duration::from_secs(30));

        // first hit still inside the window
        assert!(matches!(
            limiter.check(ip(1), start + Duration::from_secs(59)),
            Decision::Limited { .. }
        ));

        // first hit has left, second has not
        assert_eq!(
            limiter.check(ip(1), start + Duration::from_secs(60)),
            Decision::Allowed {
                remaining: 0,
                reset: Duration::from_secs(30),
            }
        );
        assert!(matches!(
            limiter.check(ip(1), start + Duration::from_secs(61)),
            Decision::Limited { .. }
        ));
    }

    #[test]
    fn rejected_requests_are_not_counted() {
        let limiter = SlidingWindow::new(Duration::from_secs(10), 1);
        let start = Instant::now();

        limiter.check(ip(1), start);
        for secs in 1..10 {
            limiter.check(ip(1), start + Duration::from_secs(secs));
        }

        assert!(matches!(
            limiter.check(ip(1), start + Duration::from_secs(10)),
            Decision::Allowed { .. }
        ));
    }

    #[test]
    fn zero_max_limits_everything() {
        let limiter = SlidingWindow::new(Duration::from_secs(10), 0);

        assert_eq!(
            limiter.check(ip(1), Instant::now()),
            Decision::Limited {
                retry_after: Duration::from_secs(10)
            }
        );
    }

    #[test]
    fn stale_clients_are_swept() {
        let limiter = SlidingWindow::new(Duration::from_secs(1), 5);
        let start = Instant::now();

        for n in 0..SWEEP_THRESHOLD {
            let client = Some(IpAddr::from([10, (n >> 16) as u8, (n >> 8) as u8, n as u8]));
            limiter.check(client, start);
        }
        assert_eq!(limiter.tracked_clients(), SWEEP_THRESHOLD);

        limiter.check(ip(1), start + Duration::from_secs(2));
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.sweep_at(), SWEEP_THRESHOLD);
    }

    #[test]
    fn busy_table_is_not_swept_on_every_hit() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 5);
        let start = Instant::now();

        for n in 0..SWEEP_THRESHOLD {
            let client = Some(IpAddr::from([10, (n >> 16) as u8, (n >> 8) as u8, n as u8]));
            limiter.check(client, start);
        }

        // every client is still inside the window, so nothing is freed
        limiter.check(ip(1), start + Duration::from_secs(1));
        assert_eq!(limiter.tracked_clients(), SWEEP_THRESHOLD);
        assert_eq!(limiter.sweep_at(), SWEEP_THRESHOLD * 2);

        // below the raised mark no sweep runs, even once clients go stale
        limiter.check(Some(IpAddr::from([192, 168, 0, 1])), start + Duration::from_secs(120));
        assert_eq!(limiter.tracked_clients(), SWEEP_THRESHOLD + 1);
    }

    #[test]
    fn rounds_reset_up() {
        assert_eq!(ceil_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ceil_secs(Duration::from_secs(3)), 3);
        assert_eq!(ceil_secs(Duration::ZERO), 0);
    }

    #[actix_web::test]
    async fn middleware_returns_429_past_the_limit() {
        let app = init_service(
            App::new()
                .wrap(RateLimit::new(Duration::from_secs(900), 2))
                .route("/", web::get().to(|| async { "ok" })),
        )
        .await;

        let request = |addr: &str| {
            TestRequest::get()
                .uri("/")
                .peer_addr(addr.parse().unwrap())
                .to_request()
        };

        let res = call_service(&app, request("127.0.0.1:4000")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("ratelimit-limit").unwrap(), "2");
        assert_eq!(res.headers().get("ratelimit-remaining").unwrap(), "1");
        assert_eq!(res.headers().get("ratelimit-policy").unwrap(), "2;w=900");

        let res = call_service(&app, request("127.0.0.1:4001")).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = call_service(&app, request("127.0.0.1:4002")).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers().get("ratelimit-remaining").unwrap(), "0");
        assert!(res.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(read_body(res).await, LIMITED_MESSAGE.as_bytes());

        // another client still gets through
        let res = call_service(&app, request("192.168.1.9:4000")).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
