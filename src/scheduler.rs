use log::info;

pub type TaskId = i32;

/// A unit of periodic work. Returning `false` ends the task's thread.
pub trait SteppableTask: Send + 'static {
    fn step(&mut self) -> bool;
}

/// Runs each task on its own named thread at a fixed period, compensating for
/// drift when a step overruns. Tasks stop when signalled or when their step
/// returns `false`.
pub struct Scheduler {
    next_task_id: TaskId,
    tasks: std::collections::HashMap<TaskId, ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Scheduler {
            next_task_id: 0,
            tasks: std::collections::HashMap::new(),
        }
    }

    /// Spawns `task` on its own thread, stepping it every `period`.
    ///
    /// # Panics
    ///
    /// Will panic if the thread does not spawn successfully.
    pub fn add_task<T>(&mut self, task: T, period: std::time::Duration) -> TaskId
    where
        T: SteppableTask,
    {
        let id = self.next_task_id;

        let (stop_sender, stop_receiver) = crossbeam_channel::bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name(std::any::type_name::<T>().to_string())
            .spawn(move || {
                run_task_with_period(task, period, &stop_receiver);
            })
            .expect("Failed to spawn thread");

        self.tasks.insert(
            id,
            ScheduledTask {
                handle,
                stop_sender,
            },
        );
        self.next_task_id += 1;
        id
    }

    pub fn stop_all_tasks(&self) {
        info!("Scheduler: Signaling all tasks to stop...");
        for task in self.tasks.values() {
            let _ = task.stop_sender.send(());
        }
    }

    pub fn wait_on_task_finish(&mut self, task_id: TaskId) {
        if let Some(task) = self.tasks.remove(&task_id) {
            let _ = task.handle.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

fn run_task_with_period<T: SteppableTask>(
    mut task: T,
    period: std::time::Duration,
    stop_receiver: &crossbeam_channel::Receiver<()>,
) {
    let mut next_run = std::time::Instant::now();
    loop {
        if !task.step() {
            break;
        }

        next_run += period;
        let now = std::time::Instant::now();

        if next_run > now {
            let sleep_dur = next_run - now;
            // Wait for timeout (next cycle) OR stop signal
            match stop_receiver.recv_timeout(sleep_dur) {
                Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            }
        } else {
            // Reset drift base if the step overran the whole period
            log::debug!("Task overran its period, resetting timer base");
            next_run = now;

            if let Ok(()) = stop_receiver.try_recv() {
                break;
            }
        }
    }
}

struct ScheduledTask {
    handle: std::thread::JoinHandle<()>,
    stop_sender: crossbeam_channel::Sender<()>,
}

#[cfg(test)]
mod tests {
    use super::{Scheduler, SteppableTask};

    // A task that counts its steps and stops itself at a limit
    #[derive(Debug)]
    struct CountingTask {
        count: usize,
        limit: usize,
        sender: std::sync::mpsc::Sender<usize>,
    }

    impl CountingTask {
        fn new(limit: usize, sender: std::sync::mpsc::Sender<usize>) -> Self {
            Self {
                count: 0,
                limit,
                sender,
            }
        }
    }

    impl SteppableTask for CountingTask {
        fn step(&mut self) -> bool {
            self.count += 1;
            self.sender.send(self.count).unwrap();
            self.count < self.limit
        }
    }

    // A task that runs until stopped externally
    #[derive(Debug)]
    struct LoopingTask;

    impl SteppableTask for LoopingTask {
        fn step(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn when_multiple_tasks_added_then_all_tasks_run_to_completion() {
        let mut scheduler = Scheduler::new();
        let (counter_1_sender, counter_1_receiver) = std::sync::mpsc::channel();
        let (counter_2_sender, counter_2_receiver) = std::sync::mpsc::channel();

        let counter_1_limit = 5;
        let counter_2_limit = 10;
        let task_1_id = scheduler.add_task(
            CountingTask::new(counter_1_limit, counter_1_sender),
            std::time::Duration::from_millis(10),
        );
        let task_2_id = scheduler.add_task(
            CountingTask::new(counter_2_limit, counter_2_sender),
            std::time::Duration::from_millis(10),
        );

        scheduler.wait_on_task_finish(task_2_id);
        scheduler.wait_on_task_finish(task_1_id);

        assert!(scheduler.tasks.is_empty());
        assert_eq!(counter_1_receiver.try_iter().count(), counter_1_limit);
        assert_eq!(counter_2_receiver.try_iter().count(), counter_2_limit);
    }

    #[test]
    fn when_stop_all_tasks_is_called_then_looping_task_terminates() {
        let mut scheduler = Scheduler::new();

        let looping_task_id =
            scheduler.add_task(LoopingTask, std::time::Duration::from_millis(10));

        std::thread::sleep(std::time::Duration::from_millis(50));
        scheduler.stop_all_tasks();
        scheduler.wait_on_task_finish(looping_task_id);

        assert!(scheduler.tasks.is_empty());
    }

    #[test]
    fn when_wait_on_task_finish_is_called_then_task_id_is_removed() {
        let mut scheduler = Scheduler::new();

        let task_id_1 = scheduler.add_task(LoopingTask, std::time::Duration::from_millis(10));
        let task_id_2 = scheduler.add_task(LoopingTask, std::time::Duration::from_millis(10));

        assert_eq!(scheduler.tasks.len(), 2);

        scheduler.stop_all_tasks();
        scheduler.wait_on_task_finish(task_id_1);

        assert_eq!(scheduler.tasks.len(), 1);
        assert!(scheduler.tasks.contains_key(&task_id_2));
        assert!(!scheduler.tasks.contains_key(&task_id_1));

        scheduler.wait_on_task_finish(task_id_2);
        assert!(scheduler.tasks.is_empty());
    }
}
