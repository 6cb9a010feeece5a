use std::time::Duration;
use chrono::{Datelike, Local, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::{interval, interval_at, sleep, Instant, Interval, MissedTickBehavior};
use crate::clock::clock_text;
use crate::export::{build_backup, should_export, write_backup};
use crate::highlight::{AlertCue, CueEvent, PulseBoard};
use crate::initialization::{Cycle, Files};
use crate::manager_carbon::{carbon_totals, co2_meter, summarize, CarbonSummary, Co2Meter, TOTALS_GRANULARITY};
use crate::manager_co2_reference::models::GlobalCo2;
use crate::manager_subscription::{Snapshot, SubscriptionManager, Transport};
use crate::manager_weather::models::WeatherReport;
use crate::models::{CardRecord, CardValue, ChartPoint, Feed, PivotSet, ViewKey};
use crate::normalizer::{normalize, Payload};
use crate::preferences::{save_visible_months, MonthToggle, VisibleMonths};
use crate::reference::{Fetched, ReferenceData};
use crate::view_cycle::{ResumeToken, ViewCycle};

/// Requests the http side sends to the dashboard
///
#[derive(Debug)]
pub enum Command {
    Select(ViewKey),
    ToggleMonth(String),
    /// Asks for a receiver of alert cues, none once the cue is closed
    ListenCues(oneshot::Sender<Option<broadcast::Receiver<CueEvent>>>),
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardView {
    #[serde(flatten)]
    pub card: CardRecord,
    pub highlight: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlobalCo2View {
    #[serde(flatten)]
    pub reference: GlobalCo2,
    pub meter: Co2Meter,
}

/// Everything a browser needs to render the dashboard
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DisplayState {
    pub active_view: Option<ViewKey>,
    pub paused: bool,
    pub clock: String,
    pub cards: Vec<CardView>,
    pub chart: Vec<ChartPoint>,
    pub daily_chart: Vec<ChartPoint>,
    pub co2_gauge: Option<Co2Meter>,
    pub pivots: PivotSet,
    pub carbon: CarbonSummary,
    pub global_co2: Option<GlobalCo2View>,
    pub weather: Option<WeatherReport>,
    pub visible_months: Vec<MonthToggle>,
}

/// The http side's end of the dashboard
///
#[derive(Clone)]
pub struct DashboardHandle {
    pub commands: UnboundedSender<Command>,
    pub state: watch::Receiver<DisplayState>,
}

enum Flow {
    Continue,
    ArmResume(ResumeToken),
    Stop,
}

/// Owner of all dashboard state. Runs as a single task, everything else talks
/// to it through channels
///
pub struct Dashboard<T: Transport, R: ReferenceData> {
    cycle_config: Cycle,
    backup_dir: String,
    cache_dir: String,
    cycle: ViewCycle,
    subscriptions: SubscriptionManager<T>,
    reference: R,
    months: VisibleMonths,
    card_pulses: PulseBoard<CardValue>,
    cue: AlertCue,
    co2_in_flight: bool,
    month0: usize,
    state: DisplayState,
    publisher: watch::Sender<DisplayState>,
    snapshots: Option<UnboundedReceiver<Snapshot>>,
    commands: Option<UnboundedReceiver<Command>>,
}

impl<T: Transport, R: ReferenceData> Dashboard<T, R> {
    /// Returns a new dashboard and the handle to reach it with
    ///
    /// # Arguments
    ///
    /// * 'cycle_config' - timer periods
    /// * 'files' - cache and backup directories
    /// * 'transport' - realtime store to subscribe against
    /// * 'reference' - weather and global CO2 source
    /// * 'months' - restored month visibility preference
    pub fn new(cycle_config: &Cycle, files: &Files, transport: T, reference: R, months: VisibleMonths) -> (Self, DashboardHandle) {
        let (snapshot_tx, snapshot_rx) = unbounded_channel();
        let (command_tx, command_rx) = unbounded_channel();

        let state = DisplayState { visible_months: months.ordered(), ..Default::default() };
        let (publisher, state_rx) = watch::channel(state.clone());

        let dashboard = Self {
            cycle_config: cycle_config.clone(),
            backup_dir: files.backup_dir.clone(),
            cache_dir: files.cache_dir.clone(),
            cycle: ViewCycle::default(),
            subscriptions: SubscriptionManager::new(transport, snapshot_tx),
            reference,
            months,
            card_pulses: PulseBoard::default(),
            cue: AlertCue::default(),
            co2_in_flight: false,
            month0: current_month0(),
            state,
            publisher,
            snapshots: Some(snapshot_rx),
            commands: Some(command_rx),
        };

        (dashboard, DashboardHandle { commands: command_tx, state: state_rx })
    }

    /// Runs the dashboard until shut down or until every handle is gone
    pub async fn run(mut self) {
        let (Some(mut snapshots), Some(mut commands)) = (self.snapshots.take(), self.commands.take()) else {
            error!("dashboard already ran");
            return;
        };
        let (fetched_tx, mut fetched) = unbounded_channel();

        let tick_period = Duration::from_secs(self.cycle_config.tick_secs);
        let pause = Duration::from_secs(self.cycle_config.pause_secs);
        let export_period = Duration::from_secs(self.cycle_config.export_check_secs);

        let mut tick = delayed(interval_at(Instant::now() + tick_period, tick_period));
        let mut export_check = delayed(interval_at(Instant::now() + export_period, export_period));
        let mut clock = delayed(interval(Duration::from_secs(1)));

        let resume = sleep(pause);
        tokio::pin!(resume);
        let mut resume_token: Option<ResumeToken> = None;

        let pulse = sleep(Duration::ZERO);
        tokio::pin!(pulse);
        let mut pulse_armed = false;

        self.enter(self.cycle.active(), &fetched_tx);
        self.publish();
        info!("dashboard running on {}", self.cycle.active());

        loop {
            tokio::select! {
                Some(snapshot) = snapshots.recv() => self.on_snapshot(snapshot),
                command = commands.recv() => match self.on_command(command, &fetched_tx).await {
                    Flow::Continue => (),
                    Flow::ArmResume(token) => {
                        resume.as_mut().reset(Instant::now() + pause);
                        resume_token = Some(token);
                    }
                    Flow::Stop => break,
                },
                _ = tick.tick() => {
                    if let Some(view) = self.cycle.tick() {
                        self.enter(view, &fetched_tx);
                    }
                }
                _ = &mut resume, if resume_token.is_some() => {
                    if let Some(token) = resume_token.take() {
                        self.cycle.resume(token);
                    }
                }
                _ = export_check.tick() => self.check_export().await,
                _ = clock.tick() => self.on_clock().await,
                _ = &mut pulse, if pulse_armed => self.card_pulses.expire(Instant::now()),
                Some(result) = fetched.recv() => self.on_fetched(result),
            }

            match self.card_pulses.next_deadline() {
                Some(deadline) => {
                    pulse.as_mut().reset(deadline);
                    pulse_armed = true;
                }
                None => pulse_armed = false,
            }
            self.publish();
        }

        self.teardown();
    }

    /// Makes a view active, its subscriptions replace the previous ones and
    /// data of the previous view is cleared
    fn enter(&mut self, view: ViewKey, fetched_tx: &UnboundedSender<Fetched>) {
        self.subscriptions.activate(view);
        debug!("subscribed to {:?}", self.subscriptions.active_paths());

        self.state.cards.clear();
        self.state.chart.clear();
        self.state.daily_chart.clear();
        self.card_pulses.reset();

        if view == ViewKey::Overview {
            self.reference.request_weather(fetched_tx.clone());
            if self.co2_in_flight {
                debug!("global co2 fetch already in flight");
            } else {
                self.co2_in_flight = true;
                self.reference.request_global_co2(fetched_tx.clone());
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: Snapshot) {
        if !self.subscriptions.is_current(&snapshot) {
            debug!("dropping stale snapshot of {}", snapshot.feed.path());
            return;
        }

        match normalize(&snapshot.feed, &snapshot.data) {
            Payload::Cards(cards) => self.show_cards(cards),
            Payload::Chart(points) => self.state.chart = points,
            Payload::DailyChart(points) => self.state.daily_chart = points,
            Payload::Pivot(Some(table)) => {
                if let Feed::Pivot(domain) = snapshot.feed {
                    self.state.pivots.set(domain, table);
                    self.state.carbon = summarize(&carbon_totals(
                        &self.state.pivots.electricity,
                        &self.state.pivots.vehicle,
                        TOTALS_GRANULARITY,
                    ));
                }
            }
            Payload::Gauge(Some(ppm)) => self.state.co2_gauge = Some(co2_meter(ppm)),
            Payload::Pivot(None) | Payload::Gauge(None) => {
                debug!("empty snapshot of {}, keeping previous value", snapshot.feed.path());
            }
        }
    }

    /// Shows a new row of cards, every changed value gets its highlight and its own cue
    fn show_cards(&mut self, cards: Vec<CardRecord>) {
        let values: Vec<CardValue> = cards.iter().map(|c| c.value.clone()).collect();
        let changed = self.card_pulses.observe_all(&values, Instant::now(), self.highlight_duration());

        if let Some(view) = self.subscriptions.active_view() {
            for title in changed.iter().filter_map(|&i| cards.get(i)).map(|c| c.title.clone()) {
                if let Err(e) = self.cue.play(CueEvent { view, title }) {
                    debug!("alert cue not played: {}", e);
                }
            }
        }

        self.state.cards = cards.into_iter()
            .map(|card| CardView { card, highlight: false })
            .collect();
    }

    async fn on_command(&mut self, command: Option<Command>, fetched_tx: &UnboundedSender<Fetched>) -> Flow {
        match command {
            Some(Command::Select(view)) => {
                let (changed, token) = self.cycle.manual_select(view);
                if let Some(view) = changed {
                    self.enter(view, fetched_tx);
                }
                Flow::ArmResume(token)
            }
            Some(Command::ToggleMonth(month)) => {
                self.toggle_month(&month).await;
                Flow::Continue
            }
            Some(Command::ListenCues(reply)) => {
                let _ = reply.send(self.cue.sender().map(|s| s.subscribe()));
                Flow::Continue
            }
            Some(Command::Shutdown) | None => Flow::Stop,
        }
    }

    async fn toggle_month(&mut self, month: &str) {
        match self.months.toggle(month, self.month0) {
            Some(visible) => {
                debug!("month {} visible: {}", month, visible);
                self.save_months().await;
            }
            None => warn!("month '{}' is unknown or has not started", month),
        }
    }

    async fn on_clock(&mut self) {
        self.state.clock = clock_text(&Utc::now());

        let month0 = current_month0();
        if month0 != self.month0 {
            self.roll_month(month0).await;
        }
    }

    /// Restores the month preference for a new current month, which makes it visible
    async fn roll_month(&mut self, month0: usize) {
        info!("month changed, restoring month visibility");
        self.month0 = month0;
        self.months = VisibleMonths::restore(Some(std::mem::take(&mut self.months)), month0);
        self.save_months().await;
    }

    async fn save_months(&mut self) {
        self.state.visible_months = self.months.ordered();
        if let Err(e) = save_visible_months(&self.cache_dir, &self.months).await {
            warn!("month preference not saved: {}", e);
        }
    }

    fn on_fetched(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Weather(report) => self.state.weather = Some(report),
            Fetched::GlobalCo2(result) => {
                self.co2_in_flight = false;
                if let Some(reference) = result {
                    let meter = co2_meter(reference.ppm);
                    self.state.global_co2 = Some(GlobalCo2View { reference, meter });
                }
            }
        }
    }

    async fn check_export(&self) {
        if should_export(&Local::now()) {
            info!("monthly export due");
            match build_backup(&self.state.pivots, Utc::now()) {
                Ok(backup) => {
                    if let Err(e) = write_backup(&self.backup_dir, &backup).await {
                        error!("monthly export failed: {}", e);
                    }
                }
                Err(e) => error!("monthly export failed: {}", e),
            }
        }
    }

    fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.cycle_config.highlight_millis)
    }

    fn publish(&mut self) {
        let flags = self.card_pulses.active_flags(Instant::now());
        for (card, flag) in self.state.cards.iter_mut().zip(flags) {
            card.highlight = flag;
        }
        self.state.active_view = Some(self.cycle.active());
        self.state.paused = self.cycle.is_paused();

        self.publisher.send_replace(self.state.clone());
    }

    fn teardown(&mut self) {
        self.subscriptions.release();
        self.cue.close();
        info!("dashboard stopped");
    }
}

fn delayed(mut interval: Interval) -> Interval {
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Current month as zero based index, for restoring the month preference
pub fn current_month0() -> usize {
    Local::now().month0() as usize
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use serde_json::json;
    use tokio::task::LocalSet;
    use crate::manager_subscription::fake::FakeTransport;
    use crate::reference::fake::FakeReference;
    use super::*;

    struct Rig {
        dashboard: Dashboard<FakeTransport, FakeReference>,
        handle: DashboardHandle,
        transport: FakeTransport,
        reference: FakeReference,
        fetched_tx: UnboundedSender<Fetched>,
        fetched_rx: UnboundedReceiver<Fetched>,
    }

    impl Rig {
        /// Delivers everything queued on the snapshot and fetch channels
        fn drain(&mut self) {
            let snapshots: Vec<Snapshot> = {
                let rx = self.dashboard.snapshots.as_mut().unwrap();
                std::iter::from_fn(|| rx.try_recv().ok()).collect()
            };
            snapshots.into_iter().for_each(|s| self.dashboard.on_snapshot(s));

            while let Ok(fetched) = self.fetched_rx.try_recv() {
                self.dashboard.on_fetched(fetched);
            }
            self.dashboard.publish();
        }

        fn state(&self) -> DisplayState {
            self.handle.state.borrow().clone()
        }
    }

    fn files(name: &str) -> Files {
        let dir = std::env::temp_dir().join(format!("green_dashboard_{}_{}", name, std::process::id()));
        Files {
            cache_dir: format!("{}/cache/", dir.display()),
            backup_dir: format!("{}/backup/", dir.display()),
        }
    }

    fn rig(name: &str) -> Rig {
        let transport = FakeTransport::default();
        let reference = FakeReference::default();
        let (dashboard, handle) = Dashboard::new(
            &Cycle::default(),
            &files(name),
            transport.clone(),
            reference.clone(),
            VisibleMonths::restore(None, 9),
        );
        let (fetched_tx, fetched_rx) = unbounded_channel();

        let mut rig = Rig { dashboard, handle, transport, reference, fetched_tx, fetched_rx };
        rig.dashboard.month0 = 9;
        let tx = rig.fetched_tx.clone();
        rig.dashboard.enter(ViewKey::Overview, &tx);
        rig
    }

    fn paths(view: ViewKey) -> BTreeSet<String> {
        Feed::for_view(view).iter().map(|f| f.path()).collect()
    }

    #[tokio::test]
    async fn overview_subscribes_and_requests_reference_data_once() {
        let mut rig = rig("overview");
        assert_eq!(rig.transport.live_paths(), paths(ViewKey::Overview));
        assert_eq!(*rig.reference.weather_requests.borrow(), 1);
        assert_eq!(*rig.reference.co2_requests.borrow(), 1);

        let tx = rig.fetched_tx.clone();
        rig.dashboard.enter(ViewKey::Water, &tx);
        rig.dashboard.enter(ViewKey::Overview, &tx);
        assert_eq!(*rig.reference.weather_requests.borrow(), 2);
        assert_eq!(*rig.reference.co2_requests.borrow(), 1, "one co2 fetch in flight at a time");

        rig.reference.reply(Fetched::GlobalCo2(None));
        rig.drain();
        rig.dashboard.enter(ViewKey::Overview, &tx);
        assert_eq!(*rig.reference.co2_requests.borrow(), 2);
    }

    #[tokio::test]
    async fn reference_results_reach_the_display() {
        let mut rig = rig("reference");
        rig.reference.reply(Fetched::GlobalCo2(Some(GlobalCo2 { ppm: 423.19, last_update: "2025-03-10".into() })));
        rig.drain();

        let global = rig.state().global_co2.unwrap();
        assert_eq!(global.meter.label, "Excellent");
        assert_eq!(global.reference.last_update, "2025-03-10");
    }

    #[tokio::test]
    async fn pivots_drive_the_carbon_summary() {
        let mut rig = rig("pivots");
        rig.transport.push("charts/ELECTRICITY_PIVOT", json!({
            "month": [{"x": "Jan", "month_y1": 10}, {"x": "Feb", "month_y1": 20}, {"x": "Mar", "month_y1": 30}]
        }));
        rig.drain();
        assert_eq!(rig.state().carbon.total_electricity, "17.40");
        assert_eq!(rig.state().carbon.total, "17.40");

        rig.transport.push("charts/ELECTRICITY_PIVOT", json!(null));
        rig.drain();
        assert_eq!(rig.state().carbon.total, "17.40", "null pivot keeps the previous table");
    }

    #[tokio::test]
    async fn carbon_without_electricity_is_never_negative() {
        let mut rig = rig("carbon_zero");
        rig.transport.push("charts/CO2_PIVOT", json!([{"series": "day", "x": "1", "day_y1": 410}]));
        rig.drain();
        let carbon = rig.state().carbon;
        assert_eq!(carbon.total_electricity, "0.00");
        assert_eq!(carbon.total, "0.00");

        rig.transport.push("charts/VEHICLE_PIVOT", json!([{"series": "month", "x": "Jan", "month_y3": 1000}]));
        rig.drain();
        let carbon = rig.state().carbon;
        assert_eq!(carbon.total_electricity, "0.00");
        assert_eq!(carbon.total, "0.18");
        assert!(carbon.equivalences.iter().all(|e| !e.value.starts_with('-')));
    }

    #[tokio::test]
    async fn pivots_are_published_as_delivered() {
        let mut rig = rig("pivot_raw");
        let raw = json!([{"series": "month", "x": "Jan", "month_y1": 3}, {"x": "untagged"}]);
        rig.transport.push("charts/WATER_PIVOT", raw.clone());
        rig.drain();

        let published = serde_json::to_value(rig.state()).unwrap();
        assert_eq!(published["pivots"]["water"], raw);
    }

    #[tokio::test]
    async fn gauge_and_cards_follow_snapshots() {
        let mut rig = rig("gauge");
        rig.transport.push("cards/CO2/card25", json!({"title": "CO2 avg", "value": "612.5"}));
        rig.transport.push("cards/OVERVIEW", json!({"card1": {"title": "Power", "value": 5}}));
        rig.drain();

        let state = rig.state();
        assert_eq!(state.co2_gauge.unwrap().label, "Mediocre");
        assert_eq!(state.cards.len(), 1);
        assert_eq!(state.cards[0].card.value, CardValue::Number(5.0));

        rig.transport.push("cards/OVERVIEW", json!(null));
        rig.drain();
        assert!(rig.state().cards.is_empty());
    }

    #[tokio::test]
    async fn snapshots_of_a_previous_view_are_ignored() {
        let mut rig = rig("stale");
        let stale = rig.transport.sink("cards/OVERVIEW").unwrap();

        let tx = rig.fetched_tx.clone();
        rig.dashboard.enter(ViewKey::Water, &tx);
        stale.deliver(json!({"card1": {"title": "Old", "value": 1}}));
        rig.drain();
        assert!(rig.state().cards.is_empty());

        rig.transport.push("cards/WATER", json!({"card1": {"title": "Flow", "value": 2}}));
        rig.drain();
        assert_eq!(rig.state().cards[0].card.title, "Flow");
    }

    #[tokio::test(start_paused = true)]
    async fn changed_card_values_highlight_and_cue() {
        let mut rig = rig("highlight");
        let (reply_tx, reply_rx) = oneshot::channel();
        rig.dashboard.on_command(Some(Command::ListenCues(reply_tx)), &rig.fetched_tx.clone()).await;
        let mut cues = reply_rx.await.unwrap().unwrap();

        for value in [5, 5, 7] {
            rig.transport.push("cards/OVERVIEW", json!({"card1": {"title": "Power", "value": value}}));
            rig.drain();
        }
        assert!(rig.state().cards[0].highlight);
        assert_eq!(cues.try_recv().unwrap(), CueEvent { view: ViewKey::Overview, title: "Power".into() });
        assert!(cues.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1000)).await;
        rig.dashboard.card_pulses.expire(Instant::now());
        rig.dashboard.publish();
        assert!(!rig.state().cards[0].highlight);
    }

    #[tokio::test]
    async fn each_changed_card_gets_its_own_cue() {
        let mut rig = rig("cues");
        let mut cues = rig.dashboard.cue.sender().unwrap().subscribe();

        for (a, b, c) in [(1, 2, 3), (1, 5, 6)] {
            rig.transport.push("cards/OVERVIEW", json!({
                "card1": {"title": "A", "value": a},
                "card2": {"title": "B", "value": b},
                "card3": {"title": "C", "value": c},
            }));
            rig.drain();
        }

        let titles: Vec<String> = std::iter::from_fn(|| cues.try_recv().ok()).map(|c| c.title).collect();
        assert_eq!(titles, vec!["B", "C"]);
    }

    #[tokio::test]
    async fn months_ahead_are_not_toggled_and_a_new_month_shows() {
        let mut rig = rig("month_roll");
        let tx = rig.fetched_tx.clone();
        rig.dashboard.on_command(Some(Command::ToggleMonth("November".into())), &tx).await;
        rig.dashboard.publish();
        assert!(!rig.state().visible_months[10].visible);

        rig.dashboard.on_command(Some(Command::ToggleMonth("October".into())), &tx).await;
        rig.dashboard.roll_month(10).await;
        rig.dashboard.publish();

        let state = rig.state();
        assert!(state.visible_months[10].visible);
        assert!(!state.visible_months[11].visible);

        let saved = crate::preferences::load_visible_months(&rig.dashboard.cache_dir, 10).await;
        assert!(saved.ordered()[10].visible);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_do_not_burst_after_a_stall() {
        let mut tick = delayed(interval(Duration::from_secs(300)));
        assert_eq!(tick.missed_tick_behavior(), MissedTickBehavior::Delay);

        tick.tick().await;
        tokio::time::advance(Duration::from_secs(1000)).await;
        let stalled = Instant::now();
        tick.tick().await;
        tick.tick().await;
        assert_eq!(Instant::now(), stalled + Duration::from_secs(300));
    }

    #[tokio::test]
    async fn toggled_months_are_published_and_saved() {
        let mut rig = rig("months");
        let tx = rig.fetched_tx.clone();
        rig.dashboard.on_command(Some(Command::ToggleMonth("March".into())), &tx).await;
        rig.dashboard.publish();

        let state = rig.state();
        assert_eq!(state.visible_months[2], MonthToggle { month: "March", visible: false });

        let saved = crate::preferences::load_visible_months(&rig.dashboard.cache_dir, 9).await;
        assert!(!saved.ordered()[2].visible);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_selection_pauses_the_cycle_then_resumes_from_it() {
        let transport = FakeTransport::default();
        let (dashboard, handle) = Dashboard::new(
            &Cycle::default(),
            &files("cycle"),
            transport.clone(),
            FakeReference::default(),
            VisibleMonths::default(),
        );

        LocalSet::new().run_until(async move {
            let task = tokio::task::spawn_local(dashboard.run());
            let view = || handle.state.borrow().active_view;

            sleep(Duration::from_secs(10)).await;
            assert_eq!(view(), Some(ViewKey::Overview));

            handle.commands.send(Command::Select(ViewKey::Electricity)).unwrap();
            sleep(Duration::from_secs(1)).await;
            assert_eq!(view(), Some(ViewKey::Electricity));
            assert!(handle.state.borrow().paused);
            assert_eq!(transport.live_paths(), paths(ViewKey::Electricity));

            // resume at 131 s, the tick at 300 s advances from the selected view
            sleep(Duration::from_secs(125)).await;
            assert!(!handle.state.borrow().paused);
            assert_eq!(view(), Some(ViewKey::Electricity));

            sleep(Duration::from_secs(170)).await;
            assert_eq!(view(), Some(ViewKey::Co2));
            assert_eq!(transport.live_paths(), paths(ViewKey::Co2));

            handle.commands.send(Command::Shutdown).unwrap();
            task.await.unwrap();
            assert!(transport.live_paths().is_empty());
        }).await;
    }
}
