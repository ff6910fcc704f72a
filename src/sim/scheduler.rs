//! Delayed and repeating callbacks
//!
//! A [`Scheduler`] is a plain entity that counts frames and runs its action.
//! With `repeat_count == 0` it runs forever; otherwise it runs exactly
//! `repeat_count` times and then removes itself.

use super::context::FrameContext;
use super::entity::{Behavior, Entity, EntityCore, EntityKind};
use crate::Frames;
use crate::error::Result;

/// Scheduled action
pub type Action = Box<dyn FnMut(&mut FrameContext<'_>) -> Result<()>>;

pub struct Scheduler {
    action: Action,
    delay: u64,
    countdown: u64,
    repeat_count: u32,
    runs: u32,
}

impl Scheduler {
    /// Run `action` after `delay` frames, `repeat_count` times (0 = forever)
    pub fn new(
        action: impl FnMut(&mut FrameContext<'_>) -> Result<()> + 'static,
        delay: Frames,
        repeat_count: u32,
    ) -> Self {
        Self {
            action: Box::new(action),
            delay: delay.get(),
            countdown: delay.get(),
            repeat_count,
            runs: 0,
        }
    }

    /// Wrap into a plain entity ready to be added to a screen
    pub fn into_entity(self) -> Entity {
        Entity::new(EntityCore::plain(), self)
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }
}

impl Behavior for Scheduler {
    fn kind(&self) -> EntityKind {
        EntityKind::Scheduler
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.repeat_count != 0 && self.runs >= self.repeat_count {
            return Ok(());
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            return Ok(());
        }

        (self.action)(ctx)?;
        self.runs += 1;
        if self.repeat_count != 0 && self.runs >= self.repeat_count {
            log::trace!("Scheduler {} finished after {} runs", core.id, self.runs);
            ctx.commands.remove(core.id);
        } else {
            self.countdown = self.delay;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::platform::{HeadlessPlatform, StopHandle};
    use crate::sim::context::SimContext;
    use crate::sim::entity::EntityId;
    use crate::sim::screen::{Screen, ScreenConfig};

    fn counter_screen(delay: u64, repeat: u32) -> (Screen, Rc<Cell<u64>>, EntityId) {
        let fired = Rc::new(Cell::new(0));
        let mut screen = Screen::new(ScreenConfig::default(), SimContext::default());
        let counter = Rc::clone(&fired);
        let id = screen
            .schedule(
                move |_ctx| {
                    counter.set(counter.get() + 1);
                    Ok(())
                },
                Frames(delay),
                repeat,
            )
            .unwrap();
        (screen, fired, id)
    }

    fn ticks(screen: &mut Screen, n: usize) {
        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        for _ in 0..n {
            screen.tick(&mut platform, &stop).unwrap();
        }
    }

    #[test]
    fn test_runs_exactly_repeat_count_times() {
        let (mut screen, fired, id) = counter_screen(2, 3);
        ticks(&mut screen, 3);
        assert_eq!(fired.get(), 1);
        ticks(&mut screen, 20);
        assert_eq!(fired.get(), 3);
        assert!(screen.entity(id).is_none());
    }

    #[test]
    fn test_zero_repeat_runs_forever() {
        let (mut screen, fired, id) = counter_screen(0, 0);
        ticks(&mut screen, 50);
        assert_eq!(fired.get(), 50);
        assert!(screen.entity(id).is_some());
    }

    #[test]
    fn test_delay_in_seconds() {
        let (mut screen, fired, _) = counter_screen(Frames::seconds(1).get(), 1);
        ticks(&mut screen, 60);
        assert_eq!(fired.get(), 0);
        ticks(&mut screen, 1);
        assert_eq!(fired.get(), 1);
    }
}
