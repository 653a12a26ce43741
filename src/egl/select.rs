//! Framebuffer configuration selection.
//!
//! The driver's `eglChooseConfig` only guarantees that the configurations it
//! returns are at least as good as the request. Among those, the closest
//! match is picked by summing the surplus bits over the color, depth and
//! stencil sizes, with a preference for 8/8/8 RGB when the caller asked for
//! very little color.

use khronos_egl as egl;
use log::{debug, info, warn};
use thiserror::Error;

use crate::attributes::GlAttributes;
use crate::error::ErrorCode;

/// Upper bound on the configurations requested from the driver per pass.
pub const MAX_CONFIGS: usize = 128;

// EGL_EXT_pixel_format_float
pub const COLOR_COMPONENT_TYPE_EXT: egl::Int = 0x3339;
pub const COLOR_COMPONENT_TYPE_FLOAT_EXT: egl::Int = 0x333B;
// EGL_KHR_create_context, revision 13
pub const OPENGL_ES3_BIT_KHR: egl::Int = 0x0040;

/// Attributes that take part in the bit-difference score.
const SCORED: [egl::Int; 6] = [
    egl::RED_SIZE,
    egl::GREEN_SIZE,
    egl::BLUE_SIZE,
    egl::ALPHA_SIZE,
    egl::DEPTH_SIZE,
    egl::STENCIL_SIZE,
];

/// Requests at or below this many RGB bits prefer a true-color candidate.
const TRUECOLOR_THRESHOLD: egl::Int = 16;

/// Each stage keeps the last EGL error it saw, `EGL_SUCCESS` when the
/// driver answered without one.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    #[error("the driver offered no configurations")]
    NoCandidates(ErrorCode),
    #[error("the driver offered configurations but none were usable")]
    NoUsableCandidate(ErrorCode),
}

impl SelectError {
    pub fn code(self) -> ErrorCode {
        match self {
            SelectError::NoCandidates(code) | SelectError::NoUsableCandidate(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Pick an exact 8/8/8 configuration over a tighter match when the
    /// request asks for 16 bits of RGB or less. Turn this off on hardware
    /// that really needs the small format it asked for.
    pub favor_truecolor: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            favor_truecolor: true,
        }
    }
}

/// Session state that shapes the attribute list besides the request itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigTarget {
    pub offscreen: bool,
    /// Extra `EGL_SURFACE_TYPE` bits, zero for none.
    pub surface_type: egl::Int,
    /// Whether `EGL_OPENGL_ES3_BIT_KHR` may be requested.
    pub es3_renderable: bool,
}

/// The attribute list handed to the driver plus what scoring needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    /// `NONE`-terminated key/value list.
    pub attribs: Vec<egl::Int>,
    pub color_bits: egl::Int,
    pub required_visual_id: Option<egl::Int>,
}

impl ConfigRequest {
    pub fn new(
        attrs: &GlAttributes,
        target: &ConfigTarget,
        caveat_none: bool,
        required_visual_id: Option<egl::Int>,
    ) -> Self {
        let mut attribs = vec![
            egl::RED_SIZE,
            attrs.red_size,
            egl::GREEN_SIZE,
            attrs.green_size,
            egl::BLUE_SIZE,
            attrs.blue_size,
        ];

        if caveat_none {
            attribs.extend([egl::CONFIG_CAVEAT, egl::NONE]);
        }

        let optional = [
            (egl::ALPHA_SIZE, attrs.alpha_size),
            (egl::BUFFER_SIZE, attrs.buffer_size),
            (egl::DEPTH_SIZE, attrs.depth_size),
            (egl::STENCIL_SIZE, attrs.stencil_size),
            (egl::SAMPLE_BUFFERS, attrs.multisample_buffers),
            (egl::SAMPLES, attrs.multisample_samples),
        ];
        for (key, value) in optional {
            if value != 0 {
                attribs.extend([key, value]);
            }
        }

        if attrs.float_buffers {
            attribs.extend([COLOR_COMPONENT_TYPE_EXT, COLOR_COMPONENT_TYPE_FLOAT_EXT]);
        }

        if target.offscreen {
            attribs.extend([egl::SURFACE_TYPE, egl::PBUFFER_BIT]);
        }

        let renderable = if !attrs.is_es() {
            egl::OPENGL_BIT
        } else if attrs.major_version >= 3 && target.es3_renderable {
            OPENGL_ES3_BIT_KHR
        } else if attrs.major_version >= 2 {
            egl::OPENGL_ES2_BIT
        } else {
            egl::OPENGL_ES_BIT
        };
        attribs.extend([egl::RENDERABLE_TYPE, renderable]);

        if target.surface_type != 0 {
            attribs.extend([egl::SURFACE_TYPE, target.surface_type]);
        }

        attribs.push(egl::NONE);

        Self {
            attribs,
            color_bits: attrs.color_bits(),
            required_visual_id,
        }
    }

    /// Key/value pairs up to the terminator.
    pub fn pairs(&self) -> impl Iterator<Item = (egl::Int, egl::Int)> + '_ {
        self.attribs
            .chunks_exact(2)
            .take_while(|pair| pair[0] != egl::NONE)
            .map(|pair| (pair[0], pair[1]))
    }

    /// Pairs that contribute to the score: scored keys with a concrete value.
    fn scored_pairs(&self) -> impl Iterator<Item = (egl::Int, egl::Int)> + '_ {
        self.pairs().filter(|&(key, value)| {
            SCORED.contains(&key) && value != egl::DONT_CARE && value != 0
        })
    }
}

/// The attributes of a driver configuration that selection looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateAttribs {
    pub red: egl::Int,
    pub green: egl::Int,
    pub blue: egl::Int,
    pub alpha: egl::Int,
    pub depth: egl::Int,
    pub stencil: egl::Int,
    pub native_visual_id: egl::Int,
}

impl CandidateAttribs {
    fn size(&self, key: egl::Int) -> egl::Int {
        match key {
            egl::RED_SIZE => self.red,
            egl::GREEN_SIZE => self.green,
            egl::BLUE_SIZE => self.blue,
            egl::ALPHA_SIZE => self.alpha,
            egl::DEPTH_SIZE => self.depth,
            egl::STENCIL_SIZE => self.stencil,
            _ => 0,
        }
    }

    pub fn is_truecolor(&self) -> bool {
        self.red == 8 && self.green == 8 && self.blue == 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<C> {
    pub config: C,
    pub attribs: CandidateAttribs,
}

/// Sum of surplus bits the candidate offers over the request. Lower is better.
pub fn bit_difference(request: &ConfigRequest, attribs: &CandidateAttribs) -> egl::Int {
    // Sizes come straight from caller input, so the arithmetic saturates.
    request
        .scored_pairs()
        .map(|(key, requested)| attribs.size(key).saturating_sub(requested))
        .fold(0, egl::Int::saturating_add)
}

/// Picks the closest candidate. Pure: the same request and candidates always
/// give the same answer, and earlier candidates win ties.
pub fn select<C: Copy>(
    request: &ConfigRequest,
    candidates: &[Candidate<C>],
    policy: SelectionPolicy,
) -> Result<C, SelectError> {
    if candidates.is_empty() {
        return Err(SelectError::NoCandidates(ErrorCode::SUCCESS));
    }

    // The visual id is a soft requirement: only restrict when something matches.
    let required = request.required_visual_id.filter(|&id| {
        candidates
            .iter()
            .any(|candidate| candidate.attribs.native_visual_id == id)
    });
    if let (Some(id), None) = (request.required_visual_id, required) {
        debug!("no config has native visual id {id:#x}, ignoring the requirement");
    }

    let mut best: Option<(egl::Int, C)> = None;
    let mut best_truecolor: Option<(egl::Int, C)> = None;

    for candidate in candidates {
        if let Some(id) = required {
            if candidate.attribs.native_visual_id != id {
                continue;
            }
        }

        let diff = bit_difference(request, &candidate.attribs);

        if best.map_or(true, |(best_diff, _)| diff < best_diff) {
            best = Some((diff, candidate.config));
        }

        if candidate.attribs.is_truecolor()
            && best_truecolor.map_or(true, |(best_diff, _)| diff < best_diff)
        {
            best_truecolor = Some((diff, candidate.config));
        }
    }

    if policy.favor_truecolor && request.color_bits <= TRUECOLOR_THRESHOLD {
        if let Some((_, config)) = best_truecolor {
            return Ok(config);
        }
    }

    best.map(|(_, config)| config)
        .ok_or(SelectError::NoUsableCandidate(ErrorCode::SUCCESS))
}

/// The driver side of selection: `eglChooseConfig` and `eglGetConfigAttrib`.
pub trait ConfigSource {
    type Config: Copy;

    /// Configurations at least as good as the `NONE`-terminated `attribs`,
    /// at most `max` of them.
    fn choose(&self, attribs: &[egl::Int], max: usize) -> Result<Vec<Self::Config>, egl::Error>;

    fn attrib(&self, config: Self::Config, attribute: egl::Int) -> Result<egl::Int, egl::Error>;
}

fn read_candidate<S: ConfigSource>(
    source: &S,
    config: S::Config,
) -> Result<Candidate<S::Config>, egl::Error> {
    Ok(Candidate {
        config,
        attribs: CandidateAttribs {
            red: source.attrib(config, egl::RED_SIZE)?,
            green: source.attrib(config, egl::GREEN_SIZE)?,
            blue: source.attrib(config, egl::BLUE_SIZE)?,
            alpha: source.attrib(config, egl::ALPHA_SIZE)?,
            depth: source.attrib(config, egl::DEPTH_SIZE)?,
            stencil: source.attrib(config, egl::STENCIL_SIZE)?,
            native_visual_id: source.attrib(config, egl::NATIVE_VISUAL_ID)?,
        },
    })
}

fn choose_pass<S: ConfigSource>(
    source: &S,
    request: &ConfigRequest,
    policy: SelectionPolicy,
) -> Result<S::Config, SelectError> {
    let configs = match source.choose(&request.attribs, MAX_CONFIGS) {
        Ok(configs) if !configs.is_empty() => configs,
        Ok(_) => return Err(SelectError::NoCandidates(ErrorCode::SUCCESS)),
        Err(err) => {
            debug!("eglChooseConfig failed: {err}");
            return Err(SelectError::NoCandidates(err.into()));
        }
    };

    let mut last_error = ErrorCode::SUCCESS;
    let candidates: Vec<_> = configs
        .into_iter()
        .filter_map(|config| match read_candidate(source, config) {
            Ok(candidate) => Some(candidate),
            Err(err) => {
                warn!("skipping config with unreadable attributes: {err}");
                last_error = err.into();
                None
            }
        })
        .collect();

    if candidates.is_empty() {
        return Err(SelectError::NoUsableCandidate(last_error));
    }

    select(request, &candidates, policy)
}

/// Two passes: first without slow or non-conformant configurations, then
/// with everything the driver has.
pub fn choose_config<S: ConfigSource>(
    source: &S,
    attrs: &GlAttributes,
    target: &ConfigTarget,
    required_visual_id: Option<egl::Int>,
    policy: SelectionPolicy,
) -> Result<S::Config, SelectError> {
    let strict = ConfigRequest::new(attrs, target, true, required_visual_id);
    match choose_pass(source, &strict, policy) {
        Ok(config) => return Ok(config),
        Err(err) => debug!("no conformant config: {err}"),
    }

    let relaxed = ConfigRequest::new(attrs, target, false, required_visual_id);
    let config = choose_pass(source, &relaxed, policy)?;
    info!("found a slow EGL config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::attributes::ContextProfile;

    #[derive(Debug, Clone)]
    struct FakeConfig {
        red: egl::Int,
        green: egl::Int,
        blue: egl::Int,
        alpha: egl::Int,
        depth: egl::Int,
        stencil: egl::Int,
        visual: egl::Int,
        caveat: egl::Int,
    }

    impl FakeConfig {
        fn rgb(red: egl::Int, green: egl::Int, blue: egl::Int) -> Self {
            Self {
                red,
                green,
                blue,
                alpha: 0,
                depth: 0,
                stencil: 0,
                visual: 0,
                caveat: egl::NONE,
            }
        }

        fn depth(mut self, depth: egl::Int) -> Self {
            self.depth = depth;
            self
        }

        fn alpha(mut self, alpha: egl::Int) -> Self {
            self.alpha = alpha;
            self
        }

        fn visual(mut self, visual: egl::Int) -> Self {
            self.visual = visual;
            self
        }

        fn slow(mut self) -> Self {
            self.caveat = egl::SLOW_CONFIG;
            self
        }

        fn get(&self, key: egl::Int) -> Option<egl::Int> {
            Some(match key {
                egl::RED_SIZE => self.red,
                egl::GREEN_SIZE => self.green,
                egl::BLUE_SIZE => self.blue,
                egl::ALPHA_SIZE => self.alpha,
                egl::DEPTH_SIZE => self.depth,
                egl::STENCIL_SIZE => self.stencil,
                egl::NATIVE_VISUAL_ID => self.visual,
                egl::CONFIG_CAVEAT => self.caveat,
                egl::RENDERABLE_TYPE => egl::OPENGL_ES2_BIT | egl::OPENGL_BIT,
                egl::SURFACE_TYPE => egl::WINDOW_BIT | egl::PBUFFER_BIT,
                _ => return None,
            })
        }

        /// `eglChooseConfig` semantics for the attributes the fake knows about.
        fn matches(&self, attribs: &[egl::Int]) -> bool {
            attribs
                .chunks_exact(2)
                .take_while(|pair| pair[0] != egl::NONE)
                .all(|pair| {
                    let (key, wanted) = (pair[0], pair[1]);
                    if wanted == egl::DONT_CARE {
                        return true;
                    }
                    match (key, self.get(key)) {
                        (egl::CONFIG_CAVEAT, Some(actual)) => actual == wanted,
                        (egl::RENDERABLE_TYPE | egl::SURFACE_TYPE, Some(actual)) => {
                            actual & wanted == wanted
                        }
                        (_, Some(actual)) => actual >= wanted,
                        (_, None) => true,
                    }
                })
        }
    }

    #[derive(Default)]
    struct FakeDriver {
        configs: Vec<FakeConfig>,
        unreadable: bool,
        rejects: Option<egl::Error>,
        calls: RefCell<Vec<Vec<egl::Int>>>,
    }

    impl FakeDriver {
        fn new(configs: Vec<FakeConfig>) -> Self {
            Self {
                configs,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ConfigSource for FakeDriver {
        type Config = usize;

        fn choose(&self, attribs: &[egl::Int], max: usize) -> Result<Vec<usize>, egl::Error> {
            self.calls.borrow_mut().push(attribs.to_vec());
            if let Some(err) = self.rejects {
                return Err(err);
            }
            Ok(self
                .configs
                .iter()
                .enumerate()
                .filter(|(_, config)| config.matches(attribs))
                .map(|(index, _)| index)
                .take(max)
                .collect())
        }

        fn attrib(&self, config: usize, attribute: egl::Int) -> Result<egl::Int, egl::Error> {
            if self.unreadable {
                return Err(egl::Error::BadConfig);
            }
            self.configs[config]
                .get(attribute)
                .ok_or(egl::Error::BadAttribute)
        }
    }

    fn request(red: egl::Int, green: egl::Int, blue: egl::Int, depth: egl::Int) -> GlAttributes {
        GlAttributes {
            red_size: red,
            green_size: green,
            blue_size: blue,
            depth_size: depth,
            ..Default::default()
        }
    }

    fn choose(driver: &FakeDriver, attrs: &GlAttributes) -> Result<usize, SelectError> {
        choose_config(
            driver,
            attrs,
            &ConfigTarget::default(),
            None,
            SelectionPolicy::default(),
        )
    }

    #[test]
    fn attribute_list_always_carries_rgb() {
        let attrs = request(0, 0, 0, 0);
        let req = ConfigRequest::new(&attrs, &ConfigTarget::default(), false, None);
        assert_eq!(
            req.attribs,
            vec![
                egl::RED_SIZE,
                0,
                egl::GREEN_SIZE,
                0,
                egl::BLUE_SIZE,
                0,
                egl::RENDERABLE_TYPE,
                egl::OPENGL_ES2_BIT,
                egl::NONE,
            ]
        );
    }

    #[test]
    fn attribute_list_includes_requested_extras() {
        let attrs = GlAttributes {
            alpha_size: 8,
            buffer_size: 32,
            stencil_size: 8,
            multisample_buffers: 1,
            multisample_samples: 4,
            float_buffers: true,
            major_version: 3,
            ..request(8, 8, 8, 24)
        };
        let target = ConfigTarget {
            offscreen: true,
            surface_type: egl::WINDOW_BIT,
            es3_renderable: true,
        };
        let req = ConfigRequest::new(&attrs, &target, true, Some(0x21));
        let pairs: Vec<_> = req.pairs().collect();

        assert_eq!(pairs[3], (egl::CONFIG_CAVEAT, egl::NONE));
        assert!(pairs.contains(&(egl::ALPHA_SIZE, 8)));
        assert!(pairs.contains(&(egl::BUFFER_SIZE, 32)));
        assert!(pairs.contains(&(egl::DEPTH_SIZE, 24)));
        assert!(pairs.contains(&(egl::STENCIL_SIZE, 8)));
        assert!(pairs.contains(&(egl::SAMPLE_BUFFERS, 1)));
        assert!(pairs.contains(&(egl::SAMPLES, 4)));
        assert!(pairs.contains(&(COLOR_COMPONENT_TYPE_EXT, COLOR_COMPONENT_TYPE_FLOAT_EXT)));
        assert!(pairs.contains(&(egl::SURFACE_TYPE, egl::PBUFFER_BIT)));
        assert!(pairs.contains(&(egl::SURFACE_TYPE, egl::WINDOW_BIT)));
        assert!(pairs.contains(&(egl::RENDERABLE_TYPE, OPENGL_ES3_BIT_KHR)));
        assert_eq!(req.attribs.last(), Some(&egl::NONE));
        assert_eq!(req.required_visual_id, Some(0x21));
    }

    #[test]
    fn renderable_type_follows_profile() {
        let renderable = |attrs: GlAttributes, es3: bool| {
            let target = ConfigTarget {
                es3_renderable: es3,
                ..Default::default()
            };
            ConfigRequest::new(&attrs, &target, false, None)
                .pairs()
                .find(|&(key, _)| key == egl::RENDERABLE_TYPE)
                .map(|(_, value)| value)
        };

        let es = |major| GlAttributes {
            major_version: major,
            ..Default::default()
        };
        assert_eq!(renderable(es(1), true), Some(egl::OPENGL_ES_BIT));
        assert_eq!(renderable(es(2), true), Some(egl::OPENGL_ES2_BIT));
        assert_eq!(renderable(es(3), true), Some(OPENGL_ES3_BIT_KHR));
        assert_eq!(renderable(es(3), false), Some(egl::OPENGL_ES2_BIT));

        let desktop = GlAttributes {
            profile: ContextProfile::Core,
            major_version: 4,
            ..Default::default()
        };
        assert_eq!(renderable(desktop, true), Some(egl::OPENGL_BIT));
    }

    #[test]
    fn zero_request_scores_zero_and_prefers_truecolor() {
        let driver = FakeDriver::new(vec![FakeConfig::rgb(5, 6, 5), FakeConfig::rgb(8, 8, 8)]);
        let attrs = request(0, 0, 0, 0);

        let req = ConfigRequest::new(&attrs, &ConfigTarget::default(), true, None);
        for config in &driver.configs {
            let attribs = CandidateAttribs {
                red: config.red,
                green: config.green,
                blue: config.blue,
                ..Default::default()
            };
            assert_eq!(bit_difference(&req, &attribs), 0);
        }

        assert_eq!(choose(&driver, &attrs), Ok(1));
    }

    #[test]
    fn truecolor_preference_can_be_disabled() {
        let driver = FakeDriver::new(vec![FakeConfig::rgb(5, 6, 5), FakeConfig::rgb(8, 8, 8)]);
        let exact = SelectionPolicy {
            favor_truecolor: false,
        };
        let picked = choose_config(
            &driver,
            &request(5, 6, 5, 0),
            &ConfigTarget::default(),
            None,
            exact,
        );
        assert_eq!(picked, Ok(0));
    }

    #[test]
    fn high_color_requests_take_the_tightest_match() {
        let driver = FakeDriver::new(vec![
            FakeConfig::rgb(8, 8, 8),
            FakeConfig::rgb(6, 6, 6),
            FakeConfig::rgb(10, 10, 10),
        ]);
        // 18 bits of RGB is above the true-color threshold.
        assert_eq!(choose(&driver, &request(6, 6, 6, 0)), Ok(1));
    }

    #[test]
    fn depth_request_filters_then_scores() {
        let configs = vec![
            FakeConfig::rgb(5, 6, 5),
            FakeConfig::rgb(8, 8, 8),
            FakeConfig::rgb(8, 8, 8).depth(24),
        ];

        let driver = FakeDriver::new(configs.clone());
        assert_eq!(choose(&driver, &request(5, 6, 5, 16)), Ok(2));

        // Without a depth request every config passes; 5+6+5 is within the
        // true-color threshold, so the best 8/8/8 config wins and the first
        // of the two tied ones is kept.
        let driver = FakeDriver::new(configs);
        assert_eq!(choose(&driver, &request(5, 6, 5, 0)), Ok(1));
    }

    #[test]
    fn selection_never_beats_a_lower_score_without_truecolor_override() {
        let sets = [
            vec![
                FakeConfig::rgb(8, 8, 8).alpha(8).depth(24),
                FakeConfig::rgb(8, 8, 8).depth(16),
                FakeConfig::rgb(10, 10, 10).alpha(2).depth(24),
            ],
            vec![
                FakeConfig::rgb(10, 10, 10).depth(32),
                FakeConfig::rgb(8, 8, 8).depth(24),
                FakeConfig::rgb(8, 8, 8).alpha(8).depth(32),
            ],
        ];
        let attrs = request(8, 8, 8, 16);

        for configs in sets {
            let driver = FakeDriver::new(configs);
            let picked = choose(&driver, &attrs).unwrap();

            let req = ConfigRequest::new(&attrs, &ConfigTarget::default(), true, None);
            let candidates: Vec<_> = (0..driver.configs.len())
                .map(|index| read_candidate(&driver, index).unwrap())
                .collect();
            let picked_diff = bit_difference(&req, &candidates[picked].attribs);
            for candidate in &candidates {
                assert!(picked_diff <= bit_difference(&req, &candidate.attribs));
            }
        }
    }

    #[test]
    fn unmatched_visual_id_is_ignored() {
        let driver = FakeDriver::new(vec![
            FakeConfig::rgb(8, 8, 8).visual(0x21),
            FakeConfig::rgb(8, 8, 8).alpha(8).visual(0x22),
        ]);
        let picked = choose_config(
            &driver,
            &request(8, 8, 8, 0),
            &ConfigTarget::default(),
            Some(0x99),
            SelectionPolicy::default(),
        );
        assert_eq!(picked, Ok(0));
    }

    #[test]
    fn matched_visual_id_restricts_candidates() {
        let driver = FakeDriver::new(vec![
            FakeConfig::rgb(8, 8, 8).visual(0x21),
            FakeConfig::rgb(8, 8, 8).alpha(8).visual(0x22),
        ]);
        let attrs = GlAttributes {
            alpha_size: 0,
            ..request(8, 8, 8, 0)
        };
        let picked = choose_config(
            &driver,
            &attrs,
            &ConfigTarget::default(),
            Some(0x22),
            SelectionPolicy::default(),
        );
        assert_eq!(picked, Ok(1));
    }

    #[test_log::test]
    fn slow_configs_are_used_on_the_second_pass() {
        let driver = FakeDriver::new(vec![FakeConfig::rgb(8, 8, 8).slow()]);
        assert_eq!(choose(&driver, &request(8, 8, 8, 0)), Ok(0));

        let calls = driver.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].windows(2).any(|w| w == &[egl::CONFIG_CAVEAT, egl::NONE][..]));
        assert!(!calls[1].contains(&egl::CONFIG_CAVEAT));
    }

    #[test]
    fn conformant_configs_need_one_pass() {
        let driver = FakeDriver::new(vec![FakeConfig::rgb(8, 8, 8)]);
        assert_eq!(choose(&driver, &request(8, 8, 8, 0)), Ok(0));
        assert_eq!(driver.calls(), 1);
    }

    #[test_log::test]
    fn empty_driver_fails_after_both_passes() {
        let driver = FakeDriver::new(vec![FakeConfig::rgb(5, 6, 5)]);
        assert_eq!(
            choose(&driver, &request(8, 8, 8, 0)),
            Err(SelectError::NoCandidates(ErrorCode::SUCCESS))
        );
        assert_eq!(driver.calls(), 2);
    }

    #[test_log::test]
    fn unreadable_configs_are_not_usable() {
        let driver = FakeDriver {
            unreadable: true,
            ..FakeDriver::new(vec![FakeConfig::rgb(8, 8, 8)])
        };
        assert_eq!(
            choose(&driver, &request(8, 8, 8, 0)),
            Err(SelectError::NoUsableCandidate(ErrorCode(egl::BAD_CONFIG)))
        );
    }

    #[test_log::test]
    fn rejected_attribute_lists_keep_the_egl_error() {
        let driver = FakeDriver {
            rejects: Some(egl::Error::BadAttribute),
            ..FakeDriver::new(vec![FakeConfig::rgb(8, 8, 8)])
        };
        let attrs = GlAttributes {
            float_buffers: true,
            ..request(8, 8, 8, 0)
        };

        let err = choose(&driver, &attrs).unwrap_err();
        assert_eq!(err, SelectError::NoCandidates(ErrorCode(egl::BAD_ATTRIBUTE)));
        assert_eq!(driver.calls(), 2);

        let message = crate::error::Error::from(err).to_string();
        assert!(message.contains("eglChooseConfig"), "{message}");
        assert!(message.contains("EGL_BAD_ATTRIBUTE"), "{message}");
    }

    #[test]
    fn extreme_sizes_saturate() {
        let attrs = GlAttributes::from_json(
            r#"{ "red_size": 2147483647, "green_size": 8, "blue_size": 8 }"#,
        )
        .unwrap();
        let req = ConfigRequest::new(&attrs, &ConfigTarget::default(), true, None);
        assert_eq!(req.color_bits, egl::Int::MAX);

        let attribs = CandidateAttribs {
            red: 8,
            green: 8,
            blue: 8,
            depth: 16,
            ..Default::default()
        };
        assert_eq!(bit_difference(&req, &attribs), 8 - egl::Int::MAX);

        let negative = GlAttributes {
            red_size: -5,
            depth_size: egl::Int::MIN + 1,
            ..request(8, 8, 8, 0)
        };
        let req = ConfigRequest::new(&negative, &ConfigTarget::default(), true, None);
        let huge = CandidateAttribs {
            red: egl::Int::MAX,
            depth: egl::Int::MAX,
            ..Default::default()
        };
        assert_eq!(bit_difference(&req, &huge), egl::Int::MAX);

        // Wrapping would bring these sizes back to 0 bits of color and
        // hand the pick to the true-color candidate.
        let huge_color = GlAttributes {
            red_size: egl::Int::MAX,
            green_size: egl::Int::MAX,
            blue_size: 2,
            ..request(0, 0, 0, 0)
        };
        let req = ConfigRequest::new(&huge_color, &ConfigTarget::default(), true, None);
        let candidate = |config, red, green, blue| Candidate {
            config,
            attribs: CandidateAttribs {
                red,
                green,
                blue,
                ..Default::default()
            },
        };
        let candidates = [candidate(0, 8, 8, 7), candidate(1, 8, 8, 8)];
        assert_eq!(select(&req, &candidates, SelectionPolicy::default()), Ok(0));
    }

    #[test]
    fn select_rejects_an_empty_list() {
        let req = ConfigRequest::new(&request(8, 8, 8, 0), &ConfigTarget::default(), true, None);
        let candidates: [Candidate<usize>; 0] = [];
        assert_eq!(
            select(&req, &candidates, SelectionPolicy::default()),
            Err(SelectError::NoCandidates(ErrorCode::SUCCESS))
        );
    }

    #[test]
    fn selection_is_idempotent() {
        let driver = FakeDriver::new(vec![
            FakeConfig::rgb(5, 6, 5).depth(16),
            FakeConfig::rgb(8, 8, 8).depth(24),
            FakeConfig::rgb(8, 8, 8).depth(16),
        ]);
        let attrs = request(5, 6, 5, 16);
        let first = choose(&driver, &attrs);
        assert_eq!(first, choose(&driver, &attrs));
        assert_eq!(first, Ok(2));
    }

    #[test]
    fn dont_care_values_are_not_scored() {
        let attrs = GlAttributes {
            depth_size: egl::DONT_CARE,
            ..request(8, 8, 8, 0)
        };
        let req = ConfigRequest::new(&attrs, &ConfigTarget::default(), true, None);
        let attribs = CandidateAttribs {
            red: 8,
            green: 8,
            blue: 8,
            depth: 24,
            ..Default::default()
        };
        assert_eq!(bit_difference(&req, &attribs), 0);
    }
}
