use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3};
use log::{debug, error, info, warn};

use crate::animation::PressAnimator;
use crate::camera::Camera;
use crate::geometry::{ButtonRole, CardGeometry, CardGeometryBuilder};
use crate::hit_test::HitTester;
use crate::input::InputState;
use crate::layout::CardLayout;
use crate::question::Answer;
use crate::scene::VisualGroup;
use crate::state::{CardDisplayState, CardError, CardState};
use crate::store::QuestionStore;
use crate::text::{GlyphMetrics, TextField, TextLayoutEngine, TextSlots};

/// What to do with a session found in storage when the card opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Continue after the stored answers.
    #[default]
    Resume,
    /// Ignore the stored answers and start at the first question. The stored
    /// session is overwritten by the next answer.
    Discard,
}

/// Result of a click on one of the card's buttons.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Answered(Answer),
    Restarted,
    /// The negative button was pressed on the finished card. Leaving the
    /// card is up to the host application.
    ExitRequested,
}

/// Owns the card: geometry, text, quiz state and click handling.
pub struct CardController {
    layout: CardLayout,
    store: QuestionStore,
    state: CardState,
    group: VisualGroup,
    geometry: CardGeometry,
    hit_tester: HitTester,
    animator: PressAnimator,
    rest_scales: HashMap<ButtonRole, Vec3>,
    text: Option<TextLayoutEngine>,
    slots: TextSlots,
    exit_requested: bool,
}

impl CardController {
    pub fn new(layout: CardLayout, store: QuestionStore, group: VisualGroup) -> Result<Self> {
        Self::with_policy(layout, store, group, ResumePolicy::default())
    }

    /// Loads the questions, restores progress per `policy` and attaches the
    /// static geometry to `group`. Fails when no questions are stored.
    pub fn with_policy(
        layout: CardLayout,
        store: QuestionStore,
        group: VisualGroup,
        policy: ResumePolicy,
    ) -> Result<Self> {
        layout.validate().context("invalid card layout")?;
        let questions = store
            .load_questions()
            .context("failed to read questions")?
            .unwrap_or_default();
        if questions.is_empty() {
            return Err(CardError::NoQuestions.into());
        }
        let state = restore_state(&store, questions, policy)?;

        group.set_transform(Mat4::from_translation(layout.position));
        let geometry = CardGeometryBuilder::build(&layout);
        group
            .attach_geometry(&geometry)
            .context("failed to attach card geometry")?;
        let rest_scales = geometry
            .buttons
            .iter()
            .filter_map(|button| {
                group
                    .get(button.role.visual_name())
                    .map(|visual| (button.role, visual.scale))
            })
            .collect();

        info!(
            "card ready with {} question(s), starting at question {}",
            state.questions().len(),
            state.current_index() + 1
        );

        Ok(Self {
            hit_tester: HitTester::new(layout.camera.clone()),
            animator: PressAnimator::new(layout.press),
            layout,
            store,
            state,
            group,
            geometry,
            rest_scales,
            text: None,
            slots: TextSlots::new(),
            exit_requested: false,
        })
    }

    /// Called once the font has loaded; builds every text field.
    pub fn attach_font(&mut self, metrics: Arc<dyn GlyphMetrics>) -> Result<()> {
        self.text = Some(TextLayoutEngine::new(metrics));
        self.rebuild_text()
    }

    /// Called when the font could not be loaded. The card keeps working
    /// without any text; there is no retry.
    pub fn font_failed(&mut self, err: &anyhow::Error) {
        error!("font failed to load, card text disabled: {err:?}");
        self.text = None;
        self.slots.clear(&self.group);
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn layout(&self) -> &CardLayout {
        &self.layout
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn group(&self) -> &VisualGroup {
        &self.group
    }

    pub fn geometry(&self) -> &CardGeometry {
        &self.geometry
    }

    pub fn text_slots(&self) -> &TextSlots {
        &self.slots
    }

    pub fn display(&self) -> CardDisplayState {
        self.state.derive_display_text()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Camera the host is rendering with; `None` falls back to the layout's.
    pub fn set_active_camera(&mut self, camera: Option<Camera>) {
        self.hit_tester.set_active_camera(camera);
    }

    pub fn camera(&self, viewport: (u32, u32)) -> Camera {
        self.hit_tester.camera(viewport)
    }

    /// Resolves the clicked button, if any, and handles the click.
    pub fn handle_pointer_click(
        &mut self,
        pointer: Vec2,
        viewport: (u32, u32),
        now: Duration,
    ) -> Result<Option<ClickOutcome>> {
        let Some(hit) = self
            .hit_tester
            .pick(pointer, viewport, &self.group, &self.geometry.buttons)
        else {
            debug!("click at {pointer} missed the buttons");
            return Ok(None);
        };
        self.handle_click(hit.role, now).map(Some)
    }

    pub fn update_hover(&self, pointer: Vec2, viewport: (u32, u32)) -> Option<ButtonRole> {
        self.hit_tester
            .update_hover(pointer, viewport, &self.group, &self.geometry.buttons)
    }

    /// Re-resolves hover for a pointer that has not moved since the buttons
    /// last changed scale.
    pub fn refresh_hover(&self, input: &InputState, viewport: (u32, u32)) -> Option<ButtonRole> {
        input
            .pointer()
            .and_then(|pointer| self.update_hover(pointer, viewport))
    }

    pub fn handle_click(&mut self, role: ButtonRole, now: Duration) -> Result<ClickOutcome> {
        let outcome = if !self.state.is_finished() {
            let answer = self.state.record_answer(role == ButtonRole::Affirmative)?;
            self.persist();
            self.rebuild_text()?;
            ClickOutcome::Answered(answer)
        } else if role == ButtonRole::Affirmative {
            self.state.restart(&self.store);
            self.release_presses();
            self.exit_requested = false;
            self.rebuild_text()?;
            info!("quiz restarted");
            ClickOutcome::Restarted
        } else {
            info!("exit requested");
            self.exit_requested = true;
            ClickOutcome::ExitRequested
        };
        self.press(role, now);
        Ok(outcome)
    }

    /// Restores buttons whose press feedback has expired.
    pub fn tick(&mut self, now: Duration) -> Vec<ButtonRole> {
        let released = self.animator.advance(now);
        for role in &released {
            let rest = self.rest_scale(*role);
            self.group.set_scale(role.visual_name(), rest);
        }
        released
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.animator.next_deadline()
    }

    /// Drops pending press feedback and puts every button back at rest.
    fn release_presses(&mut self) {
        for role in ButtonRole::ALL {
            if self.animator.cancel(role) {
                let rest = self.rest_scale(role);
                self.group.set_scale(role.visual_name(), rest);
            }
        }
    }

    fn press(&mut self, role: ButtonRole, now: Duration) {
        let factor = self.animator.press(role, now);
        let pressed = self.rest_scale(role) * factor;
        self.group.set_scale(role.visual_name(), pressed);
    }

    fn rest_scale(&self, role: ButtonRole) -> Vec3 {
        self.rest_scales.get(&role).copied().unwrap_or(Vec3::ONE)
    }

    fn persist(&self) {
        if let Err(err) = self.store.persist_session(self.state.session()) {
            warn!("failed to persist session, keeping it in memory: {err:?}");
        }
    }

    fn rebuild_text(&mut self) -> Result<()> {
        self.slots.clear(&self.group);
        let Some(engine) = &self.text else {
            debug!("no font attached, skipping text");
            return Ok(());
        };
        let display = self.state.derive_display_text();
        let styles = self.layout.text;
        let fields = [
            (
                TextField::Header,
                engine.layout(&display.header_text, styles.header, self.layout.header_anchor()),
            ),
            (
                TextField::Body,
                engine.layout(&display.body_text, styles.body, self.layout.body_anchor()),
            ),
            (
                TextField::Footer,
                engine.layout(&display.footer_text, styles.footer, self.layout.footer_anchor()),
            ),
        ];
        let mut visuals = Vec::from(fields);
        for button in &self.geometry.buttons {
            let label = match button.role {
                ButtonRole::Affirmative => &display.button1_text,
                ButtonRole::Negative => &display.button2_text,
            };
            visuals.push((
                TextField::for_button(button.role),
                engine.layout_button_label(
                    label,
                    styles.button,
                    button.position,
                    self.layout.dimensions.button_depth,
                ),
            ));
        }
        for (field, visual) in visuals {
            self.slots
                .install(&self.group, field, visual)
                .with_context(|| format!("failed to install {field:?} text"))?;
        }
        Ok(())
    }
}

fn restore_state(
    store: &QuestionStore,
    questions: Vec<crate::question::Question>,
    policy: ResumePolicy,
) -> Result<CardState> {
    if policy == ResumePolicy::Discard {
        return Ok(CardState::new(questions)?);
    }
    let session = match store.load_session() {
        Ok(Some(session)) => session,
        Ok(None) => return Ok(CardState::new(questions)?),
        Err(err) => {
            warn!("ignoring unreadable stored session: {err:?}");
            return Ok(CardState::new(questions)?);
        }
    };
    match CardState::resume(questions.clone(), session) {
        Ok(state) => Ok(state),
        Err(err) => {
            warn!("stored session does not match the questions, starting over: {err}");
            Ok(CardState::new(questions)?)
        }
    }
}
