//! Turtle state machine and graphics intents.
//!
//! The interpreter never draws. Each state change on a turtle is recorded as
//! a `GraphicsEvent` that the host renders however it likes. Coordinates
//! have y pointing up; heading 0 is north and angles grow clockwise.

use crate::value::{List, Value, Word};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A pen or background color as the program named it.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Palette index.
    Index(i64),
    Rgb(f64, f64, f64),
    Named(String),
}

impl Color {
    /// A number, a `[r g b]` list, or a color-name word.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Word(w) => match w.as_number() {
                Some(n) => n.as_int().map(Self::Index),
                None if !w.is_empty() => Some(Self::Named(w.as_str().to_lowercase())),
                None => None,
            },
            Value::List(list) => {
                let parts: Vec<f64> = list
                    .iter()
                    .map(|v| v.as_number().map(crate::value::Number::as_f64))
                    .collect::<Option<_>>()?;
                match parts[..] {
                    [r, g, b] => Some(Self::Rgb(r, g, b)),
                    _ => None,
                }
            }
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Index(n) => Value::Word(Word::from(*n)),
            Self::Rgb(r, g, b) => Value::List(
                [*r, *g, *b]
                    .into_iter()
                    .map(|c| Value::Word(Word::from(c)))
                    .collect(),
            ),
            Self::Named(name) => Value::word(name),
        }
    }
}

/// One drawing intent for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsOp {
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    MoveTo(Point),
    Heading(f64),
    PenUp,
    PenDown,
    PenSize(f64),
    PenColor(Color),
    Show,
    Hide,
    ClearScreen,
    Clean,
    Background(Color),
    Circle {
        center: Point,
        radius: f64,
        color: Color,
        width: f64,
    },
    /// An arc of `angle` degrees clockwise from `start` (a heading).
    Arc {
        center: Point,
        radius: f64,
        start: f64,
        angle: f64,
        color: Color,
        width: f64,
    },
    Dot {
        at: Point,
        size: f64,
        color: Color,
    },
    Stamp {
        at: Point,
        heading: f64,
    },
    Fill {
        at: Point,
        color: Color,
    },
    BeginFill(Color),
    EndFill {
        points: Vec<Point>,
        color: Color,
    },
    Label {
        at: Point,
        heading: f64,
        text: String,
    },
    Created {
        at: Point,
        heading: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsEvent {
    pub turtle: usize,
    pub op: GraphicsOp,
}

#[derive(Debug, Clone)]
pub struct Turtle {
    pub id: usize,
    pub position: Point,
    /// Degrees in [0, 360).
    pub heading: f64,
    pub pen_down: bool,
    pub pen_size: f64,
    pub pen_color: Color,
    pub visible: bool,
    pub filling: bool,
    fill_path: Vec<Point>,
}

impl Turtle {
    fn new(id: usize) -> Self {
        Self {
            id,
            position: Point::ORIGIN,
            heading: 0.0,
            pen_down: true,
            pen_size: 1.0,
            pen_color: Color::Index(0),
            visible: true,
            filling: false,
            fill_path: Vec::new(),
        }
    }
}

pub fn normalize_heading(degrees: f64) -> f64 {
    let h = degrees.rem_euclid(360.0);
    if h >= 360.0 { 0.0 } else { h }
}

/// Sine and cosine of a heading, exact on the axes.
#[allow(clippy::float_cmp)]
fn sin_cos(heading: f64) -> (f64, f64) {
    match normalize_heading(heading) {
        h if h == 0.0 => (0.0, 1.0),
        h if h == 90.0 => (1.0, 0.0),
        h if h == 180.0 => (0.0, -1.0),
        h if h == 270.0 => (-1.0, 0.0),
        h => h.to_radians().sin_cos(),
    }
}

/// All turtles plus the actor stack that picks the current one.
#[derive(Debug)]
pub struct TurtleWorld {
    /// Indexed by turtle id; turtles are never deleted.
    turtles: Vec<Turtle>,
    /// Never empty; the base actor is turtle 0.
    actors: Vec<usize>,
    background: Color,
    pending: Vec<GraphicsEvent>,
}

impl Default for TurtleWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TurtleWorld {
    pub fn new() -> Self {
        Self {
            turtles: vec![Turtle::new(0)],
            actors: vec![0],
            background: Color::Index(7),
            pending: Vec::new(),
        }
    }

    pub fn current_id(&self) -> usize {
        self.actors.last().copied().unwrap_or(0)
    }

    pub fn current(&self) -> &Turtle {
        &self.turtles[self.current_id()]
    }

    fn current_mut(&mut self) -> &mut Turtle {
        let id = self.current_id();
        &mut self.turtles[id]
    }

    fn emit(&mut self, op: GraphicsOp) {
        let turtle = self.current_id();
        self.pending.push(GraphicsEvent { turtle, op });
    }

    /// Take the events produced since the last drain.
    pub fn drain(&mut self) -> Vec<GraphicsEvent> {
        std::mem::take(&mut self.pending)
    }

    // ── Movement ────────────────────────────────────────────────────

    /// Move along the heading. A target off the finite plane leaves the
    /// turtle where it is and returns false.
    pub fn forward(&mut self, distance: f64) -> bool {
        let turtle = self.current();
        let (sin, cos) = sin_cos(turtle.heading);
        let to = Point {
            x: turtle.position.x + distance * sin,
            y: turtle.position.y + distance * cos,
        };
        if !to.is_finite() {
            return false;
        }
        self.move_to(to);
        true
    }

    pub fn right(&mut self, degrees: f64) {
        let heading = self.current().heading + degrees;
        self.set_heading(heading);
    }

    pub fn set_heading(&mut self, degrees: f64) {
        let heading = normalize_heading(degrees);
        self.current_mut().heading = heading;
        self.emit(GraphicsOp::Heading(heading));
    }

    /// Move to a point, drawing a line if the pen is down.
    pub fn move_to(&mut self, to: Point) {
        let turtle = self.current_mut();
        let from = turtle.position;
        turtle.position = to;
        if turtle.filling {
            turtle.fill_path.push(to);
        }
        let op = if turtle.pen_down {
            GraphicsOp::Line {
                from,
                to,
                color: turtle.pen_color.clone(),
                width: turtle.pen_size,
            }
        } else {
            GraphicsOp::MoveTo(to)
        };
        self.emit(op);
    }

    pub fn home(&mut self) {
        self.move_to(Point::ORIGIN);
        self.set_heading(0.0);
    }

    /// Erase the drawing and send the current turtle home without drawing.
    pub fn clear_screen(&mut self) {
        self.emit(GraphicsOp::ClearScreen);
        let turtle = self.current_mut();
        turtle.position = Point::ORIGIN;
        turtle.heading = 0.0;
        turtle.filling = false;
        turtle.fill_path.clear();
    }

    pub fn clean(&mut self) {
        self.emit(GraphicsOp::Clean);
    }

    // ── Pen and visibility ──────────────────────────────────────────

    pub fn set_pen_down(&mut self, down: bool) {
        self.current_mut().pen_down = down;
        self.emit(if down {
            GraphicsOp::PenDown
        } else {
            GraphicsOp::PenUp
        });
    }

    pub fn set_pen_size(&mut self, size: f64) {
        self.current_mut().pen_size = size;
        self.emit(GraphicsOp::PenSize(size));
    }

    pub fn set_pen_color(&mut self, color: Color) {
        self.current_mut().pen_color = color.clone();
        self.emit(GraphicsOp::PenColor(color));
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.current_mut().visible = visible;
        self.emit(if visible {
            GraphicsOp::Show
        } else {
            GraphicsOp::Hide
        });
    }

    pub fn background(&self) -> &Color {
        &self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color.clone();
        self.emit(GraphicsOp::Background(color));
    }

    // ── Shapes ──────────────────────────────────────────────────────

    /// A circle centered on the turtle; the turtle does not move.
    pub fn circle(&mut self, radius: f64) {
        let turtle = self.current();
        let op = GraphicsOp::Circle {
            center: turtle.position,
            radius,
            color: turtle.pen_color.clone(),
            width: turtle.pen_size,
        };
        self.emit(op);
    }

    /// An arc centered on the turtle, starting at its heading.
    pub fn arc(&mut self, angle: f64, radius: f64) {
        let turtle = self.current();
        let op = GraphicsOp::Arc {
            center: turtle.position,
            radius,
            start: turtle.heading,
            angle,
            color: turtle.pen_color.clone(),
            width: turtle.pen_size,
        };
        self.emit(op);
    }

    pub fn dot(&mut self, size: Option<f64>) {
        let turtle = self.current();
        let size = size.unwrap_or_else(|| (turtle.pen_size + 4.0).max(turtle.pen_size * 2.0));
        let op = GraphicsOp::Dot {
            at: turtle.position,
            size,
            color: turtle.pen_color.clone(),
        };
        self.emit(op);
    }

    pub fn stamp(&mut self) {
        let turtle = self.current();
        let op = GraphicsOp::Stamp {
            at: turtle.position,
            heading: turtle.heading,
        };
        self.emit(op);
    }

    pub fn fill(&mut self) {
        let turtle = self.current();
        let op = GraphicsOp::Fill {
            at: turtle.position,
            color: turtle.pen_color.clone(),
        };
        self.emit(op);
    }

    pub fn begin_fill(&mut self) {
        let turtle = self.current_mut();
        turtle.filling = true;
        turtle.fill_path = vec![turtle.position];
        let color = turtle.pen_color.clone();
        self.emit(GraphicsOp::BeginFill(color));
    }

    /// Close the polygon traced since BEGINFILL. Without a matching
    /// BEGINFILL there is nothing to fill.
    pub fn end_fill(&mut self) {
        let turtle = self.current_mut();
        if !turtle.filling {
            return;
        }
        turtle.filling = false;
        let points = std::mem::take(&mut turtle.fill_path);
        let color = turtle.pen_color.clone();
        self.emit(GraphicsOp::EndFill { points, color });
    }

    pub fn label(&mut self, text: String) {
        let turtle = self.current();
        let op = GraphicsOp::Label {
            at: turtle.position,
            heading: turtle.heading,
            text,
        };
        self.emit(op);
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Heading from the turtle toward a point.
    #[allow(clippy::float_cmp)]
    pub fn towards(&self, target: Point) -> f64 {
        let here = self.current().position;
        let (dx, dy) = (target.x - here.x, target.y - here.y);
        if dx == 0.0 && dy == 0.0 {
            return 0.0;
        }
        normalize_heading(dx.atan2(dy).to_degrees())
    }

    pub fn distance(&self, target: Point) -> f64 {
        let here = self.current().position;
        (target.x - here.x).hypot(target.y - here.y)
    }

    // ── Multiple turtles ────────────────────────────────────────────

    /// CREATETURTLE: a fresh turtle at home becomes the current actor.
    pub fn create_turtle(&mut self) -> usize {
        let id = self.turtles.len();
        self.turtles.push(Turtle::new(id));
        self.actors.push(id);
        self.emit(GraphicsOp::Created {
            at: Point::ORIGIN,
            heading: 0.0,
        });
        id
    }

    /// CLONE: a copy of the current turtle becomes the current actor.
    pub fn clone_turtle(&mut self) -> usize {
        let id = self.turtles.len();
        let mut copy = self.current().clone();
        copy.id = id;
        let (at, heading) = (copy.position, copy.heading);
        self.turtles.push(copy);
        self.actors.push(id);
        self.emit(GraphicsOp::Created { at, heading });
        id
    }

    pub fn exists(&self, id: usize) -> bool {
        id < self.turtles.len()
    }

    /// TELL: push a turtle onto the actor stack.
    pub fn tell(&mut self, id: usize) -> bool {
        if !self.exists(id) {
            return false;
        }
        self.actors.push(id);
        true
    }

    /// REMOVEACTOR: pop the actor stack. The base actor stays.
    pub fn remove_actor(&mut self) -> bool {
        if self.actors.len() <= 1 {
            return false;
        }
        self.actors.pop();
        true
    }

    /// Actor-stack depth, so ASK can restore it after an unwind.
    pub fn actor_depth(&self) -> usize {
        self.actors.len()
    }

    pub fn restore_actors(&mut self, depth: usize) {
        self.actors.truncate(depth.max(1));
    }

    pub fn turtle_ids(&self) -> List {
        self.turtles
            .iter()
            .map(|t| Value::Word(Word::from(i64::try_from(t.id).unwrap_or(i64::MAX))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn square_corner() {
        let mut world = TurtleWorld::new();
        world.forward(100.0);
        world.right(90.0);
        world.forward(100.0);
        let t = world.current();
        assert_eq!(t.position, Point { x: 100.0, y: 100.0 });
        assert_eq!(t.heading, 90.0);
    }

    #[test]
    fn heading_wraps() {
        let mut world = TurtleWorld::new();
        world.right(-90.0);
        assert_eq!(world.current().heading, 270.0);
        world.right(450.0);
        assert_eq!(world.current().heading, 0.0);
    }

    #[test]
    fn pen_up_moves_without_line() {
        let mut world = TurtleWorld::new();
        world.set_pen_down(false);
        world.forward(10.0);
        let events = world.drain();
        assert_eq!(events[0].op, GraphicsOp::PenUp);
        assert_eq!(events[1].op, GraphicsOp::MoveTo(Point { x: 0.0, y: 10.0 }));
        assert!(world.drain().is_empty());
    }

    #[test]
    fn towards_and_distance() {
        let world = TurtleWorld::new();
        assert!(close(world.towards(Point { x: 10.0, y: 10.0 }), 45.0));
        assert!(close(world.towards(Point { x: -10.0, y: 0.0 }), 270.0));
        assert!(close(world.distance(Point { x: 3.0, y: 4.0 }), 5.0));
    }

    #[test]
    fn actor_stack() {
        let mut world = TurtleWorld::new();
        assert!(!world.remove_actor());
        let id = world.create_turtle();
        assert_eq!(world.current_id(), id);
        world.forward(5.0);
        assert!(world.remove_actor());
        assert_eq!(world.current_id(), 0);
        assert_eq!(world.current().position, Point::ORIGIN);
        assert!(world.tell(id));
        assert!(!world.tell(99));
        assert_eq!(world.current().position, Point { x: 0.0, y: 5.0 });
    }

    #[test]
    fn forward_refuses_to_leave_the_plane() {
        let mut world = TurtleWorld::new();
        assert!(world.forward(1e308));
        world.drain();
        assert!(!world.forward(1e308));
        assert_eq!(world.current().position, Point { x: 0.0, y: 1e308 });
        assert!(world.drain().is_empty());
    }

    #[test]
    fn clone_copies_state() {
        let mut world = TurtleWorld::new();
        world.forward(20.0);
        world.right(45.0);
        let id = world.clone_turtle();
        assert_eq!(world.current().id, id);
        assert_eq!(world.current().heading, 45.0);
        assert_eq!(world.turtle_ids().len(), 2);
    }

    #[test]
    fn fill_collects_path() {
        let mut world = TurtleWorld::new();
        world.begin_fill();
        world.forward(10.0);
        world.right(90.0);
        world.forward(10.0);
        world.end_fill();
        let events = world.drain();
        let last = events.last().unwrap();
        assert!(matches!(&last.op, GraphicsOp::EndFill { points, .. } if points.len() == 3));
    }

    #[test]
    fn colors_from_values() {
        assert_eq!(Color::from_value(&Value::word("Red")), Some(Color::Named("red".into())));
        assert_eq!(Color::from_value(&Value::Word(Word::from(4i64))), Some(Color::Index(4)));
        let rgb: List = [1i64, 2, 3].into_iter().map(|n| Value::Word(Word::from(n))).collect();
        assert_eq!(
            Color::from_value(&Value::List(rgb)),
            Some(Color::Rgb(1.0, 2.0, 3.0))
        );
        assert_eq!(Color::from_value(&Value::empty_list()), None);
    }
}
