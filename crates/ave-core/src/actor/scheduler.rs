//! Scheduler
//!
//! Cooperative round-robin driver for a set of actors sharing one
//! program. Each runnable actor gets a bounded slice of reductions, so
//! a long-running actor cannot starve its siblings. Actors suspended in
//! `RECV` leave the run queue and come back when their mailbox has a
//! message; with a receive timeout configured, an actor that waits too
//! long is terminated with a `ReceiveTimeout` fault.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Select;
use indexmap::IndexMap;
use tracing::{debug, error, trace, warn};

use crate::bytecode::Program;
use crate::config::VmConfig;
use crate::error::{Fault, LoadError, LoadResult};
use crate::transport::{Delivery, Transport};
use crate::vm::value::Value;

use super::actor::{Actor, ActorState, Effect};
use super::mailbox::{ActorAddr, MailboxRouter};

pub struct Scheduler {
    config: VmConfig,
    program: Arc<Program>,
    actors: IndexMap<ActorAddr, Actor>,
    run_queue: VecDeque<ActorAddr>,
    router: Arc<MailboxRouter>,
    transport: Option<Box<dyn Transport>>,
    next_addr: u64,
}

impl Scheduler {
    pub fn new(program: Program, config: VmConfig) -> Self {
        Scheduler {
            config,
            program: Arc::new(program),
            actors: IndexMap::new(),
            run_queue: VecDeque::new(),
            router: Arc::new(MailboxRouter::new()),
            transport: None,
            next_addr: 0,
        }
    }

    /// Routing table shared with transports; external senders enqueue
    /// through it from any thread
    pub fn router(&self) -> Arc<MailboxRouter> {
        Arc::clone(&self.router)
    }

    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// Instantiate a fresh actor at instruction index `entry`
    pub fn spawn(&mut self, entry: u32) -> ActorAddr {
        let addr = ActorAddr(self.next_addr);
        self.next_addr += 1;
        let actor = Actor::new(addr, Arc::clone(&self.program), entry, &self.config);
        self.router.register(addr, actor.mailbox().sender());
        self.run_queue.push_back(addr);
        self.actors.insert(addr, actor);
        debug!(actor = %addr, entry, "actor spawned");
        addr
    }

    pub fn spawn_at_label(&mut self, label: &str) -> LoadResult<ActorAddr> {
        let entry = self
            .program
            .label(label)
            .ok_or_else(|| LoadError::UnknownLabel(label.to_string()))?;
        Ok(self.spawn(entry))
    }

    pub fn actor(&self, addr: ActorAddr) -> Option<&Actor> {
        self.actors.get(&addr)
    }

    /// Actors that terminated with a fault, in spawn order
    pub fn faults(&self) -> Vec<(ActorAddr, Fault)> {
        self.actors
            .iter()
            .filter_map(|(addr, actor)| match actor.state() {
                ActorState::Faulted(fault) => Some((*addr, fault.clone())),
                _ => None,
            })
            .collect()
    }

    /// Drive all actors until every one has halted or faulted. Returns
    /// with actors still `Waiting` only when no message can ever reach
    /// them and no receive timeout is configured.
    pub fn run(&mut self) {
        loop {
            while let Some(addr) = self.run_queue.pop_front() {
                self.run_slice(addr);
                let still_runnable = self
                    .actors
                    .get(&addr)
                    .is_some_and(|actor| *actor.state() == ActorState::Runnable);
                if still_runnable {
                    self.run_queue.push_back(addr);
                }
            }
            if !self.wake_or_wait() {
                return;
            }
        }
    }

    /// Execute up to one reduction budget's worth of steps for `addr`
    fn run_slice(&mut self, addr: ActorAddr) {
        for _ in 0..self.config.reduction_budget {
            let effect = match self.actors.get_mut(&addr) {
                Some(actor) if *actor.state() == ActorState::Runnable => actor.step(),
                _ => return,
            };
            match effect {
                Ok(Effect::None) => {}
                Ok(Effect::Halt) => {
                    self.finish(addr, ActorState::Halted);
                    return;
                }
                Ok(Effect::Block) => {
                    if let Some(actor) = self.actors.get_mut(&addr) {
                        actor.state = ActorState::Waiting;
                        actor.blocked_since = Some(Instant::now());
                        trace!(actor = %addr, "actor waiting on empty mailbox");
                    }
                    return;
                }
                Ok(Effect::Spawn { dest, entry }) => {
                    let child = self.spawn(entry);
                    let write = self
                        .actors
                        .get_mut(&addr)
                        .map(|actor| actor.write_general(dest, Value::Int(child.0 as i64)));
                    if let Some(Err(fault)) = write {
                        self.fault(addr, fault);
                        return;
                    }
                }
                Ok(Effect::Send { payload, target }) => {
                    match &self.transport {
                        Some(transport) => match transport.deliver(&payload, target) {
                            Delivery::Accepted => {
                                trace!(actor = %addr, %target, "message delivered");
                                self.wake(target);
                            }
                            // Lost sends never disturb the sender
                            Delivery::Rejected(reason) => {
                                warn!(actor = %addr, %target, reason, "message lost");
                            }
                        },
                        None => {
                            warn!(actor = %addr, %target, "message lost: no transport installed");
                        }
                    }
                }
                Err(fault) => {
                    self.fault(addr, fault);
                    return;
                }
            }
        }
        trace!(actor = %addr, "reduction budget exhausted");
    }

    fn finish(&mut self, addr: ActorAddr, state: ActorState) {
        self.router.unregister(addr);
        if let Some(actor) = self.actors.get_mut(&addr) {
            debug!(actor = %addr, state = ?state, "actor finished");
            actor.state = state;
        }
    }

    fn fault(&mut self, addr: ActorAddr, fault: Fault) {
        error!(actor = %addr, %fault, "actor faulted");
        self.finish(addr, ActorState::Faulted(fault));
    }

    fn wake(&mut self, addr: ActorAddr) {
        if let Some(actor) = self.actors.get_mut(&addr) {
            if *actor.state() == ActorState::Waiting {
                actor.state = ActorState::Runnable;
                actor.blocked_since = None;
                self.run_queue.push_back(addr);
            }
        }
    }

    /// With an empty run queue, wake waiting actors whose mailboxes have
    /// filled, or wait for that to happen. Returns false when the run is
    /// over: nobody is waiting, or the waiters can never be woken.
    fn wake_or_wait(&mut self) -> bool {
        let waiting: Vec<ActorAddr> = self
            .actors
            .iter()
            .filter(|(_, actor)| *actor.state() == ActorState::Waiting)
            .map(|(addr, _)| *addr)
            .collect();
        if waiting.is_empty() {
            return false;
        }

        let mut woke = false;
        for addr in &waiting {
            let ready = self
                .actors
                .get(addr)
                .is_some_and(|actor| !actor.mailbox().is_empty());
            if ready {
                self.wake(*addr);
                woke = true;
            }
        }
        if woke {
            return true;
        }

        let Some(timeout) = self.config.receive_timeout else {
            // No timeout and no in-flight messages: the waiters are stuck
            warn!(
                waiting = waiting.len(),
                "all actors waiting on empty mailboxes; stopping"
            );
            return false;
        };

        let now = Instant::now();
        let deadline = waiting
            .iter()
            .filter_map(|addr| self.actors.get(addr))
            .filter_map(|actor| actor.blocked_since)
            .map(|since| since + timeout)
            .min()
            .unwrap_or(now);
        let arrived = {
            let receivers: Vec<_> = waiting
                .iter()
                .filter_map(|addr| self.actors.get(addr))
                .map(|actor| actor.mailbox().receiver())
                .collect();
            let mut select = Select::new();
            for &receiver in &receivers {
                select.recv(receiver);
            }
            select.ready_deadline(deadline).is_ok()
        };

        if arrived {
            for addr in &waiting {
                let ready = self
                    .actors
                    .get(addr)
                    .is_some_and(|actor| !actor.mailbox().is_empty());
                if ready {
                    self.wake(*addr);
                }
            }
        } else {
            let now = Instant::now();
            for addr in waiting {
                let expired = self
                    .actors
                    .get(&addr)
                    .and_then(|actor| actor.blocked_since)
                    .is_some_and(|since| since + timeout <= now);
                if expired {
                    self.fault(addr, Fault::ReceiveTimeout);
                }
            }
        }
        true
    }
}
