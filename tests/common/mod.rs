use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strollplan::config::PlannerConfig;
use strollplan::models::{Coordinates, Poi, TransportMode};
use strollplan::services::optimizer::{OptimizeRequest, OptimizedRoute, OptimizedStep, RouteOptimizer};
use strollplan::services::osrm::TravelTimeProvider;
use strollplan::services::places::PoiProvider;
use strollplan::services::route_planner::sequencing::TravelTimeMatrix;
use strollplan::services::route_planner::RoutePlanner;
use strollplan::{AppError, AppState, Result};

/// Minin and Pozharsky Square, Nizhny Novgorod
#[allow(dead_code)]
pub fn minin_square() -> Coordinates {
    Coordinates::new(56.3269, 44.0059).unwrap()
}

/// A handful of real places around the Nizhny Novgorod Kremlin
#[allow(dead_code)]
pub fn nizhny_pois() -> Vec<Poi> {
    vec![
        create_test_poi("Nizhny Novgorod Kremlin", 56.3287, 44.0020, "tourism.sights"),
        create_test_poi("Chkalov Stairs", 56.3302, 44.0090, "tourism.sights"),
        create_test_poi("Bolshaya Pokrovskaya Street", 56.3190, 43.9960, "tourism.sights"),
        create_test_poi("Rukavishnikov Estate", 56.3275, 44.0135, "entertainment.museum"),
        create_test_poi("Alexandrovsky Garden", 56.3305, 44.0170, "leisure.park"),
        create_test_poi("Fyodorovsky Embankment", 56.3226, 44.0185, "tourism.attraction.viewpoint"),
        create_test_poi("Arsenal Center", 56.3280, 44.0040, "entertainment.museum"),
        create_test_poi("Pechersky Monastery", 56.3160, 44.0410, "tourism.sights"),
    ]
}

/// Create a test POI with a readable description
#[allow(dead_code)]
pub fn create_test_poi(name: &str, lat: f64, lon: f64, category: &str) -> Poi {
    Poi::new(name, Coordinates::new(lat, lon).unwrap())
        .with_description(format!("Test place called {} for route checks", name))
        .with_category(category)
}

/// Planner settings with timeouts short enough for tests
#[allow(dead_code)]
pub fn get_test_planner_config() -> PlannerConfig {
    PlannerConfig {
        optimizer_timeout: Duration::from_millis(200),
        enrich_timeout: Duration::from_millis(500),
        matrix_timeout: Duration::from_millis(200),
        ..PlannerConfig::default()
    }
}

#[allow(dead_code)]
pub fn test_planner(pois: Vec<Poi>) -> RoutePlanner {
    RoutePlanner::new(Arc::new(StaticPoiProvider::new(pois)), get_test_planner_config())
}

#[allow(dead_code)]
pub fn test_state(planner: RoutePlanner) -> Arc<AppState> {
    Arc::new(AppState {
        planner,
        description_cache: None,
    })
}

/// Serve `router` on an ephemeral local port and return its base URL
#[allow(dead_code)]
pub async fn spawn_mock(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Returns the same candidates for every query
pub struct StaticPoiProvider {
    pois: Vec<Poi>,
    pub calls: AtomicUsize,
}

impl StaticPoiProvider {
    #[allow(dead_code)]
    pub fn new(pois: Vec<Poi>) -> Self {
        StaticPoiProvider {
            pois,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PoiProvider for StaticPoiProvider {
    async fn fetch_candidates(
        &self,
        _center: &Coordinates,
        _interests: &str,
        _radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Poi>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pois.iter().take(limit).cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}

pub struct FailingPoiProvider;

#[async_trait]
impl PoiProvider for FailingPoiProvider {
    async fn fetch_candidates(
        &self,
        _center: &Coordinates,
        _interests: &str,
        _radius_m: u32,
        _limit: usize,
    ) -> Result<Vec<Poi>> {
        Err(AppError::PoiProvider("HTTP 503: unavailable".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Answers with the candidates it was given, in reverse order
pub struct ReversingOptimizer;

#[async_trait]
impl RouteOptimizer for ReversingOptimizer {
    async fn optimize(&self, request: &OptimizeRequest) -> Result<Option<OptimizedRoute>> {
        let steps = request
            .candidates
            .iter()
            .rev()
            .map(|poi| OptimizedStep {
                coordinates: poi.coordinates,
                name: None,
                description: None,
            })
            .collect();

        Ok(Some(OptimizedRoute {
            steps,
            distance_km: None,
            duration_min: None,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "reversing"
    }
}

/// Answers with a fixed list of steps regardless of the request
pub struct FixedOptimizer(pub Vec<OptimizedStep>);

#[async_trait]
impl RouteOptimizer for FixedOptimizer {
    async fn optimize(&self, _request: &OptimizeRequest) -> Result<Option<OptimizedRoute>> {
        Ok(Some(OptimizedRoute {
            steps: self.0.clone(),
            distance_km: Some(3.2),
            duration_min: Some(120.0),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "fixed"
    }
}

pub struct FailingOptimizer;

#[async_trait]
impl RouteOptimizer for FailingOptimizer {
    async fn optimize(&self, _request: &OptimizeRequest) -> Result<Option<OptimizedRoute>> {
        Err(AppError::Optimizer("HTTP 500: upstream exploded".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

pub struct EmptyOptimizer;

#[async_trait]
impl RouteOptimizer for EmptyOptimizer {
    async fn optimize(&self, _request: &OptimizeRequest) -> Result<Option<OptimizedRoute>> {
        Ok(None)
    }

    fn backend_name(&self) -> &'static str {
        "empty"
    }
}

/// Sleeps far past any test timeout before answering
pub struct SlowOptimizer;

#[async_trait]
impl RouteOptimizer for SlowOptimizer {
    async fn optimize(&self, request: &OptimizeRequest) -> Result<Option<OptimizedRoute>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        ReversingOptimizer.optimize(request).await
    }

    fn backend_name(&self) -> &'static str {
        "slow"
    }
}

/// Builds a matrix from a duration function over point pairs
pub struct FnMatrixProvider<F>(pub F)
where
    F: Fn(&Coordinates, &Coordinates) -> f64 + Send + Sync;

#[async_trait]
impl<F> TravelTimeProvider for FnMatrixProvider<F>
where
    F: Fn(&Coordinates, &Coordinates) -> f64 + Send + Sync,
{
    async fn matrix(&self, points: &[Coordinates], _mode: TransportMode) -> Result<TravelTimeMatrix> {
        let durations = points
            .iter()
            .map(|from| points.iter().map(|to| Some((self.0)(from, to))).collect())
            .collect();
        Ok(TravelTimeMatrix::new(durations))
    }

    fn backend_name(&self) -> &'static str {
        "fn-matrix"
    }
}

pub struct FailingMatrixProvider;

#[async_trait]
impl TravelTimeProvider for FailingMatrixProvider {
    async fn matrix(&self, _points: &[Coordinates], _mode: TransportMode) -> Result<TravelTimeMatrix> {
        Err(AppError::TravelTime("NoRoute: no route found".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
