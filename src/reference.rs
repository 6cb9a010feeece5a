use std::sync::Arc;
use chrono::Local;
use log::warn;
use tokio::sync::mpsc::UnboundedSender;
use crate::manager_co2_reference::Co2Reference;
use crate::manager_co2_reference::models::GlobalCo2;
use crate::manager_weather::models::WeatherReport;
use crate::manager_weather::Weather;

/// Outcome of a reference data request as reported back to the dashboard
///
#[derive(Debug, PartialEq)]
pub enum Fetched {
    Weather(WeatherReport),
    /// None when the fetch failed, the request is finished either way
    GlobalCo2(Option<GlobalCo2>),
}

/// Starts reference data requests, results arrive later on 'done'
///
pub trait ReferenceData {
    fn request_weather(&self, done: UnboundedSender<Fetched>);
    fn request_global_co2(&self, done: UnboundedSender<Fetched>);
}

/// Reference data fetched over http, each request runs as its own task
///
pub struct HttpReferenceData {
    weather: Arc<Weather>,
    co2: Arc<Co2Reference>,
    cache_dir: String,
}

impl HttpReferenceData {
    pub fn new(weather: Weather, co2: Co2Reference, cache_dir: &str) -> Self {
        Self { weather: Arc::new(weather), co2: Arc::new(co2), cache_dir: cache_dir.to_string() }
    }
}

impl ReferenceData for HttpReferenceData {
    fn request_weather(&self, done: UnboundedSender<Fetched>) {
        let weather = self.weather.clone();
        tokio::spawn(async move {
            match weather.get_report().await {
                Ok(report) => { let _ = done.send(Fetched::Weather(report)); },
                Err(e) => warn!("weather fetch failed: {}", e),
            }
        });
    }

    fn request_global_co2(&self, done: UnboundedSender<Fetched>) {
        let co2 = self.co2.clone();
        let cache_dir = self.cache_dir.clone();
        tokio::spawn(async move {
            let result = co2.get_global_co2(&cache_dir, Local::now()).await
                .map_err(|e| warn!("global co2 fetch failed: {}", e))
                .ok();
            let _ = done.send(Fetched::GlobalCo2(result));
        });
    }
}

#[cfg(test)]
pub mod fake {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;

    /// Records requests and keeps the reply channel so tests decide when and what arrives
    ///
    #[derive(Clone, Default)]
    pub struct FakeReference {
        pub weather_requests: Rc<RefCell<usize>>,
        pub co2_requests: Rc<RefCell<usize>>,
        pub done: Rc<RefCell<Option<UnboundedSender<Fetched>>>>,
    }

    impl FakeReference {
        pub fn reply(&self, fetched: Fetched) {
            if let Some(done) = self.done.borrow().as_ref() {
                done.send(fetched).unwrap();
            }
        }
    }

    impl ReferenceData for FakeReference {
        fn request_weather(&self, done: UnboundedSender<Fetched>) {
            *self.weather_requests.borrow_mut() += 1;
            *self.done.borrow_mut() = Some(done);
        }

        fn request_global_co2(&self, done: UnboundedSender<Fetched>) {
            *self.co2_requests.borrow_mut() += 1;
            *self.done.borrow_mut() = Some(done);
        }
    }
}
