//! The `Context` owns all of the state of a simulation run.
//!
//! Modules keep their state in typed *data plugins* declared with
//! `define_data_plugin!` and extend `Context` with trait extensions
//! (`ContextRandomExt`, `ContextPopulationExt`, ...). Time advances by
//! executing plans in time order; one unit of time is one simulated week.
use std::any::{Any, TypeId};

use log::trace;

use crate::data_plugin::DataPlugin;
use crate::hashing::{HashMap, HashMapExt};
use crate::plan::{ExecutionPhase, PlanId, Queue};

type Callback = dyn FnOnce(&mut Context);

pub struct Context {
    plan_queue: Queue<Box<Callback>>,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_time: f64,
    shutdown_requested: bool,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            plan_queue: Queue::new(),
            data_plugins: HashMap::new(),
            current_time: 0.0,
            shutdown_requested: false,
        }
    }

    /// Add a plan to run at `time`.
    ///
    /// # Panics
    ///
    /// Panics if `time` is not finite or is earlier than the current time.
    pub fn add_plan(&mut self, time: f64, callback: impl FnOnce(&mut Context) + 'static) -> PlanId {
        self.add_plan_with_phase(time, callback, ExecutionPhase::Normal)
    }

    /// Add a plan to run at `time` in the given phase.
    ///
    /// # Panics
    ///
    /// Panics if `time` is not finite or is earlier than the current time.
    pub fn add_plan_with_phase(
        &mut self,
        time: f64,
        callback: impl FnOnce(&mut Context) + 'static,
        phase: ExecutionPhase,
    ) -> PlanId {
        assert!(
            !(time.is_nan() || time.is_infinite() || time < self.current_time),
            "Time {time} is invalid"
        );
        self.plan_queue.add_plan(time, Box::new(callback), phase)
    }

    /// Stop executing after the current plan completes. Pending
    /// plans are discarded.
    pub fn shutdown(&mut self) {
        trace!("shutdown requested at t={}", self.current_time);
        self.shutdown_requested = true;
    }

    #[must_use]
    pub fn get_current_time(&self) -> f64 {
        self.current_time
    }

    fn add_plugin<T: DataPlugin>(&mut self) {
        self.data_plugins
            .insert(TypeId::of::<T>(), Box::new(T::create_data_container()));
    }

    /// Returns the data container of `plugin`, creating it on first access.
    ///
    /// # Panics
    ///
    /// Panics if the stored container has the wrong type, which cannot
    /// happen for containers created through `define_data_plugin!`.
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        let type_id = TypeId::of::<T>();
        if !self.data_plugins.contains_key(&type_id) {
            self.add_plugin::<T>();
        }
        self.data_plugins
            .get_mut(&type_id)
            .unwrap()
            .downcast_mut::<T::DataContainer>()
            .unwrap()
    }

    /// Returns the data container of `plugin` if it has been created.
    pub fn get_data_container<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    /// Execute plans in time order until the queue is empty or `shutdown`
    /// is called.
    pub fn execute(&mut self) {
        trace!("entering event loop");
        loop {
            if self.shutdown_requested {
                self.shutdown_requested = false;
                self.plan_queue.clear();
                break;
            }

            if let Some(plan) = self.plan_queue.get_next_plan() {
                self.current_time = plan.time;
                (plan.data)(self);
            } else {
                break;
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
