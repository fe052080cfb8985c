use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::car::{Car, Direction, Floor, Status};
use crate::queue::{Request, RequestQueue};
use crate::Error::{AlreadyRunning, InvalidFloorRange, MoveTaskError};
use crate::Result;

/// Decisions and notifications the controller delegates to its owner.
pub trait StopHooks: Send + Sync + 'static {
    /// Called before the car travels to `floor`, with the pending requests.
    /// Returning true latches a stop on arrival.
    fn should_stop_at_floor(&self, floor: Floor, direction: Direction, requests: &[Request]) -> bool;

    /// Called once per move after the car has halted and reads Idle. A move
    /// started from here, or from elsewhere meanwhile, does not consult
    /// `should_stop_at_floor` until this returns.
    fn on_stop(&self, floor: Floor, direction: Direction, requests: &RequestQueue);
}

/// [`StopHooks`] built from a pair of closures.
pub struct FnHooks<S, T> {
    should_stop: S,
    on_stop: T,
}

impl<S, T> FnHooks<S, T>
where
    S: Fn(Floor, Direction, &[Request]) -> bool + Send + Sync + 'static,
    T: Fn(Floor, Direction, &RequestQueue) + Send + Sync + 'static,
{
    pub fn new(should_stop: S, on_stop: T) -> Self {
        Self {
            should_stop,
            on_stop,
        }
    }
}

impl<S, T> StopHooks for FnHooks<S, T>
where
    S: Fn(Floor, Direction, &[Request]) -> bool + Send + Sync + 'static,
    T: Fn(Floor, Direction, &RequestQueue) + Send + Sync + 'static,
{
    fn should_stop_at_floor(&self, floor: Floor, direction: Direction, requests: &[Request]) -> bool {
        (self.should_stop)(floor, direction, requests)
    }

    fn on_stop(&self, floor: Floor, direction: Direction, requests: &RequestQueue) {
        (self.on_stop)(floor, direction, requests)
    }
}

/// Motion controller for a single car.
///
/// Cloning yields another handle onto the same car. Moves run as spawned
/// tasks, so the start operations must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

struct Inner {
    min_floor: Floor,
    max_floor: Floor,
    travel_time: Duration,
    hooks: Box<dyn StopHooks>,
    requests: RequestQueue,
    // status doubles as the single-flight guard
    car: watch::Sender<Car>,
    // held by a move until its on_stop has returned
    settle: Mutex<()>,
}

impl Controller {
    pub fn new(
        min_floor: Floor,
        max_floor: Floor,
        travel_time: Duration,
        hooks: impl StopHooks,
    ) -> Result<Self> {
        if min_floor >= max_floor {
            return Err(InvalidFloorRange {
                min: min_floor,
                max: max_floor,
            });
        }
        let (car, _) = watch::channel(Car::parked(min_floor));

        Ok(Self {
            inner: Arc::new(Inner {
                min_floor,
                max_floor,
                travel_time,
                hooks: Box::new(hooks),
                requests: RequestQueue::new(),
                car,
                settle: Mutex::new(()),
            }),
        })
    }

    pub fn status(&self) -> Status {
        self.car().status
    }

    pub fn direction(&self) -> Direction {
        self.car().direction
    }

    pub fn floor(&self) -> Floor {
        self.car().floor
    }

    pub fn car(&self) -> Car {
        *self.inner.car.borrow()
    }

    pub fn min_floor(&self) -> Floor {
        self.inner.min_floor
    }

    pub fn max_floor(&self) -> Floor {
        self.inner.max_floor
    }

    /// Receives a snapshot every time status, direction or floor changes.
    pub fn subscribe(&self) -> watch::Receiver<Car> {
        self.inner.car.subscribe()
    }

    pub fn add_request(&self, floor: Floor, direction: Direction) {
        self.inner.requests.add(floor, direction);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.inner.requests.list()
    }

    pub fn start_move_up(&self) -> Result<Move> {
        self.start_move(Direction::Up)
    }

    pub fn start_move_down(&self) -> Result<Move> {
        self.start_move(Direction::Down)
    }

    /// Resolves once the car reads Idle and `on_stop` has returned for the
    /// move that brought it there.
    pub async fn idle(&self) {
        let mut car = self.subscribe();
        loop {
            // the sender lives in `self`, so the channel cannot close here
            let _ = car.wait_for(|car| car.status == Status::Idle).await;
            let _settled = self.inner.settle.lock().await;
            if self.status() == Status::Idle {
                return;
            }
        }
    }

    fn start_move(&self, direction: Direction) -> Result<Move> {
        let started = self.inner.car.send_if_modified(|car| match car.status {
            Status::Running => false,
            Status::Idle => {
                car.status = Status::Running;
                car.direction = direction;
                true
            }
        });
        if !started {
            return Err(AlreadyRunning);
        }
        info!("elevator is moving {}", direction);

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { inner.run(direction).await });
        Ok(Move { handle })
    }
}

impl Inner {
    async fn run(&self, direction: Direction) -> Floor {
        // wait out the previous move's on_stop so its removals are visible
        let _settled = self.settle.lock().await;
        let mut parked = Parked::new(&self.car);
        let mut floor = self.car.borrow().floor;

        while self.has_floor_beyond(floor, direction) {
            let next = floor + direction.delta();
            let should_stop = self
                .requests
                .inspect(|pending| self.hooks.should_stop_at_floor(next, direction, pending));

            time::sleep(self.travel_time).await;
            floor = next;
            self.car.send_modify(|car| car.floor = floor);
            debug!("elevator reaching {}...", floor);

            if should_stop {
                break;
            }
        }

        info!("elevator stopped at {}", floor);
        parked.park();
        self.hooks.on_stop(floor, direction, &self.requests);
        floor
    }

    fn has_floor_beyond(&self, floor: Floor, direction: Direction) -> bool {
        match direction {
            Direction::Up => floor < self.max_floor,
            Direction::Down => floor > self.min_floor,
        }
    }
}

/// Returns the car to Idle, at the latest when the move unwinds.
struct Parked<'a> {
    car: &'a watch::Sender<Car>,
    done: bool,
}

impl<'a> Parked<'a> {
    fn new(car: &'a watch::Sender<Car>) -> Self {
        Self { car, done: false }
    }

    fn park(&mut self) {
        if !self.done {
            self.car.send_modify(|car| car.status = Status::Idle);
            self.done = true;
        }
    }
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        self.park();
    }
}

/// Handle on a move in flight. Dropping it detaches the move, which still
/// runs to completion.
pub struct Move {
    handle: JoinHandle<Floor>,
}

impl Move {
    /// Waits for the move to finish and returns the floor it stopped at.
    pub async fn finished(self) -> Result<Floor> {
        self.handle
            .await
            .map_err(|e| MoveTaskError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;
    use crate::Error;
    use Direction::*;

    const TRAVEL: Duration = Duration::from_millis(100);

    type Log = Arc<Mutex<Vec<(Floor, Direction)>>>;

    /// Hooks that stop only at `target` and record every call.
    fn stop_at(target: Option<Floor>) -> (impl StopHooks, Log, Log) {
        let asked = Log::default();
        let stops = Log::default();
        let (a, s) = (asked.clone(), stops.clone());
        let hooks = FnHooks::new(
            move |floor, direction, _: &[Request]| {
                a.lock().unwrap().push((floor, direction));
                Some(floor) == target
            },
            move |floor, direction, _: &RequestQueue| s.lock().unwrap().push((floor, direction)),
        );
        (hooks, asked, stops)
    }

    fn matching_requests() -> impl StopHooks {
        FnHooks::new(
            |floor, direction, pending: &[Request]| pending.iter().any(|r| r.matches(floor, direction)),
            |_, _, requests: &RequestQueue| {
                requests.remove_first();
            },
        )
    }

    #[test]
    fn rejects_an_empty_floor_range() {
        let (hooks, _, _) = stop_at(None);
        assert!(matches!(
            Controller::new(3, 3, TRAVEL, hooks),
            Err(Error::InvalidFloorRange { min: 3, max: 3 })
        ));
    }

    #[test]
    fn idle_reads_are_stable() {
        let (hooks, _, _) = stop_at(None);
        let controller = Controller::new(-1, 5, TRAVEL, hooks).unwrap();

        for _ in 0..3 {
            assert_eq!(controller.status(), Status::Idle);
            assert_eq!(controller.direction(), Up);
            assert_eq!(controller.floor(), -1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn halts_at_the_top_when_nothing_stops_it() {
        let (hooks, _, stops) = stop_at(None);
        let controller = Controller::new(0, 4, TRAVEL, hooks).unwrap();

        let floor = controller.start_move_up().unwrap().finished().await.unwrap();

        assert_eq!(floor, 4);
        assert_eq!(controller.floor(), 4);
        assert_eq!(controller.status(), Status::Idle);
        assert_eq!(*stops.lock().unwrap(), vec![(4, Up)]);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_sees_the_pending_floor() {
        let (hooks, asked, stops) = stop_at(Some(3));
        let controller = Controller::new(0, 10, TRAVEL, hooks).unwrap();

        let floor = controller.start_move_up().unwrap().finished().await.unwrap();

        assert_eq!(floor, 3);
        assert_eq!(*asked.lock().unwrap(), vec![(1, Up), (2, Up), (3, Up)]);
        assert_eq!(*stops.lock().unwrap(), vec![(3, Up)]);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_is_asked_before_the_car_arrives() {
        let asked_from = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<OnceLock<Controller>> = Arc::default();
        let (record, car) = (asked_from.clone(), slot.clone());
        let hooks = FnHooks::new(
            move |floor, _, _: &[Request]| {
                let at = car.get().map(Controller::floor);
                record.lock().unwrap().push((at, floor));
                false
            },
            |_, _, _: &RequestQueue| {},
        );
        let controller = Controller::new(0, 2, TRAVEL, hooks).unwrap();
        let _ = slot.set(controller.clone());

        controller.start_move_up().unwrap().finished().await.unwrap();

        assert_eq!(*asked_from.lock().unwrap(), vec![(Some(0), 1), (Some(1), 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn advances_one_floor_per_travel_unit() {
        let (hooks, _, _) = stop_at(Some(5));
        let controller = Controller::new(0, 20, TRAVEL, hooks).unwrap();

        let moving = controller.start_move_up().unwrap();
        assert_eq!(controller.status(), Status::Running);
        assert_eq!(controller.floor(), 0);

        time::sleep(TRAVEL * 2 + TRAVEL / 2).await;
        assert_eq!(controller.floor(), 2);
        assert_eq!(controller.status(), Status::Running);

        assert_eq!(moving.finished().await.unwrap(), 5);
        assert_eq!(controller.status(), Status::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_is_rejected() {
        let (hooks, _, stops) = stop_at(Some(3));
        let controller = Controller::new(0, 10, TRAVEL, hooks).unwrap();

        let moving = controller.start_move_up().unwrap();
        time::sleep(TRAVEL + TRAVEL / 2).await;

        assert!(matches!(controller.start_move_down(), Err(Error::AlreadyRunning)));
        assert!(matches!(controller.start_move_up(), Err(Error::AlreadyRunning)));
        assert_eq!(controller.direction(), Up);
        assert_eq!(controller.floor(), 1);

        assert_eq!(moving.finished().await.unwrap(), 3);
        assert_eq!(*stops.lock().unwrap(), vec![(3, Up)]);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_from_on_stop_sees_its_removal() {
        let restarts = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<OnceLock<Controller>> = Arc::default();
        let (record, car) = (restarts.clone(), slot.clone());
        let hooks = FnHooks::new(
            |floor, direction, pending: &[Request]| pending.iter().any(|r| r.matches(floor, direction)),
            move |_, _, requests: &RequestQueue| {
                requests.remove_first();
                let mut record = record.lock().unwrap();
                if let (true, Some(controller)) = (record.is_empty(), car.get()) {
                    let status = controller.status();
                    record.push((status, controller.start_move_up().is_ok()));
                }
            },
        );
        let controller = Controller::new(0, 5, TRAVEL, hooks).unwrap();
        let _ = slot.set(controller.clone());
        controller.add_request(2, Up);
        controller.add_request(4, Up);

        assert_eq!(controller.start_move_up().unwrap().finished().await.unwrap(), 2);
        controller.idle().await;

        assert_eq!(*restarts.lock().unwrap(), vec![(Status::Idle, true)]);
        assert_eq!(controller.floor(), 4);
        assert!(controller.requests().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn startable_once_idle_resolves() {
        let stops = Arc::new(Mutex::new(0));
        let counted = stops.clone();
        let hooks = FnHooks::new(
            |_, _, _: &[Request]| true,
            move |_, _, _: &RequestQueue| {
                std::thread::sleep(Duration::from_millis(50));
                *counted.lock().unwrap() += 1;
            },
        );
        let controller = Controller::new(0, 5, Duration::from_millis(1), hooks).unwrap();

        drop(controller.start_move_up().unwrap());
        controller.idle().await;

        assert_eq!(*stops.lock().unwrap(), 1);
        assert_eq!(controller.status(), Status::Idle);
        let floor = controller.start_move_up().unwrap().finished().await.unwrap();
        assert_eq!(floor, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_hook_leaves_the_car_idle() {
        let hooks = FnHooks::new(
            |floor, _, _: &[Request]| -> bool { panic!("no decision for floor {}", floor) },
            |_, _, _: &RequestQueue| {},
        );
        let controller = Controller::new(0, 5, TRAVEL, hooks).unwrap();

        let moved = controller.start_move_up().unwrap().finished().await;

        assert!(matches!(moved, Err(Error::MoveTaskError(_))));
        assert_eq!(controller.status(), Status::Idle);
        assert_eq!(controller.floor(), 0);
        let floor = controller.start_move_down().unwrap().finished().await.unwrap();
        assert_eq!(floor, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_at_the_bound_stops_in_place() {
        let (hooks, asked, stops) = stop_at(None);
        let controller = Controller::new(0, 3, TRAVEL, hooks).unwrap();

        let floor = controller.start_move_down().unwrap().finished().await.unwrap();

        assert_eq!(floor, 0);
        assert_eq!(controller.direction(), Down);
        assert_eq!(controller.status(), Status::Idle);
        assert!(asked.lock().unwrap().is_empty());
        assert_eq!(*stops.lock().unwrap(), vec![(0, Down)]);
    }

    #[tokio::test(start_paused = true)]
    async fn floor_stays_within_bounds_across_moves() {
        let (hooks, asked, stops) = stop_at(None);
        let controller = Controller::new(-2, 2, TRAVEL, hooks).unwrap();
        let mut updates = controller.subscribe();
        let observed = tokio::spawn(async move {
            let mut floors = Vec::new();
            while updates.changed().await.is_ok() {
                floors.push(updates.borrow_and_update().floor);
            }
            floors
        });

        controller.start_move_up().unwrap().finished().await.unwrap();
        controller.start_move_down().unwrap().finished().await.unwrap();
        controller.start_move_down().unwrap().finished().await.unwrap();
        controller.start_move_up().unwrap().finished().await.unwrap();
        drop(controller);

        let in_bounds = |f: &Floor| (-2..=2).contains(f);
        assert!(observed.await.unwrap().iter().all(in_bounds));
        assert!(asked.lock().unwrap().iter().all(|(f, _)| in_bounds(f)));
        assert_eq!(
            *stops.lock().unwrap(),
            vec![(2, Up), (-2, Down), (-2, Down), (2, Up)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn matching_request_is_served_and_consumed() {
        let controller = Controller::new(0, 20, TRAVEL, matching_requests()).unwrap();
        controller.add_request(3, Up);

        let floor = controller.start_move_up().unwrap().finished().await.unwrap();

        assert_eq!(floor, 3);
        assert!(controller.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn request_added_mid_move_is_seen_by_the_next_check() {
        let controller = Controller::new(0, 20, TRAVEL, matching_requests()).unwrap();

        let moving = controller.start_move_up().unwrap();
        time::sleep(TRAVEL + TRAVEL / 2).await;
        controller.add_request(4, Up);

        assert_eq!(moving.finished().await.unwrap(), 4);
        assert!(controller.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_resolves_when_the_move_ends() {
        let (hooks, _, _) = stop_at(Some(2));
        let controller = Controller::new(0, 5, TRAVEL, hooks).unwrap();

        drop(controller.start_move_up().unwrap());
        controller.idle().await;

        assert_eq!(controller.floor(), 2);
        assert_eq!(controller.status(), Status::Idle);
    }
}
