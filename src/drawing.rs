//! Turtle primitives. Movement and pen commands change the current
//! turtle and leave graphics events behind; queries only read.

use crate::builtins::{Primitive, float, integer, list_arg};
use crate::error::{LogoDiagnostic, bad_input};
use crate::eval::Evaluator;
use crate::signal::LogoResult;
use crate::turtle::{Color, Point};
use crate::value::{List, Value, Word};
use crate::workspace::Arity;

pub static PRIMITIVES: &[Primitive] = &[
    // Movement
    Primitive::cmd(&["forward", "fd"], Arity::fixed(1), forward),
    Primitive::cmd(&["back", "bk", "backward"], Arity::fixed(1), back),
    Primitive::cmd(&["right", "rt"], Arity::fixed(1), right),
    Primitive::cmd(&["left", "lt"], Arity::fixed(1), left),
    Primitive::cmd(&["home"], Arity::fixed(0), home),
    Primitive::cmd(&["setpos"], Arity::fixed(1), setpos),
    Primitive::cmd(&["setxy"], Arity::fixed(2), setxy),
    Primitive::cmd(&["setx"], Arity::fixed(1), setx),
    Primitive::cmd(&["sety"], Arity::fixed(1), sety),
    Primitive::cmd(&["setheading", "seth"], Arity::fixed(1), setheading),
    // Screen and pen
    Primitive::cmd(&["clearscreen", "cs"], Arity::fixed(0), clearscreen),
    Primitive::cmd(&["clean"], Arity::fixed(0), clean),
    Primitive::cmd(&["penup", "pu"], Arity::fixed(0), penup),
    Primitive::cmd(&["pendown", "pd"], Arity::fixed(0), pendown),
    Primitive::cmd(&["hideturtle", "ht"], Arity::fixed(0), hideturtle),
    Primitive::cmd(&["showturtle", "st"], Arity::fixed(0), showturtle),
    Primitive::cmd(&["setpencolor", "setpc"], Arity::fixed(1), setpencolor),
    Primitive::cmd(&["setpensize", "setpenwidth"], Arity::fixed(1), setpensize),
    Primitive::cmd(&["setbackground", "setbg"], Arity::fixed(1), setbackground),
    // Shapes
    Primitive::cmd(&["circle"], Arity::fixed(1), circle),
    Primitive::cmd(&["arc"], Arity::fixed(2), arc),
    Primitive::cmd(&["dot"], Arity::new(0, 0, Some(1)), dot),
    Primitive::cmd(&["stamp"], Arity::fixed(0), stamp),
    Primitive::cmd(&["fill"], Arity::fixed(0), fill),
    Primitive::cmd(&["beginfill"], Arity::fixed(0), beginfill),
    Primitive::cmd(&["endfill"], Arity::fixed(0), endfill),
    Primitive::cmd(&["label"], Arity::fixed(1), label),
    // Queries
    Primitive::cmd(&["pos"], Arity::fixed(0), pos),
    Primitive::cmd(&["xcor", "posx"], Arity::fixed(0), xcor),
    Primitive::cmd(&["ycor", "posy"], Arity::fixed(0), ycor),
    Primitive::cmd(&["heading"], Arity::fixed(0), heading),
    Primitive::cmd(&["towards"], Arity::new(1, 1, Some(2)), towards),
    Primitive::cmd(&["distance"], Arity::new(1, 1, Some(2)), distance),
    Primitive::cmd(&["pencolor", "pc"], Arity::fixed(0), pencolor),
    Primitive::cmd(&["pensize"], Arity::fixed(0), pensize),
    Primitive::cmd(&["pendownp", "pendown?"], Arity::fixed(0), pendownp),
    Primitive::cmd(&["shownp", "shown?"], Arity::fixed(0), shownp),
    Primitive::cmd(&["background", "bg"], Arity::fixed(0), background),
    // Multiple turtles
    Primitive::cmd(&["createturtle"], Arity::fixed(0), createturtle),
    Primitive::cmd(&["clone"], Arity::fixed(0), clone),
    Primitive::cmd(&["tell"], Arity::fixed(1), tell),
    Primitive::cmd(&["ask"], Arity::fixed(2), ask),
    Primitive::cmd(&["removeactor"], Arity::fixed(0), removeactor),
    Primitive::cmd(&["who"], Arity::fixed(0), who),
    Primitive::cmd(&["turtles"], Arity::fixed(0), turtles),
];

// ── Helpers ─────────────────────────────────────────────────────────

fn real(n: f64) -> Value {
    Value::Word(Word::from(n))
}

fn id_value(id: usize) -> Value {
    Value::Word(Word::from(i64::try_from(id).unwrap_or(i64::MAX)))
}

/// A point from one `[x y]` input, or from two numbers.
fn point_arg(name: &str, args: &[Value]) -> Result<Point, LogoDiagnostic> {
    match args {
        [Value::List(list)] => {
            let bad = || bad_input(name, &args[0]);
            if list.len() != 2 {
                return Err(bad());
            }
            let x = list.first().ok_or_else(bad)?;
            let y = list.get(1).ok_or_else(bad)?;
            Ok(Point {
                x: float(name, x)?,
                y: float(name, y)?,
            })
        }
        [x, y] => Ok(Point {
            x: float(name, x)?,
            y: float(name, y)?,
        }),
        [other, ..] => Err(bad_input(name, other)),
        [] => Err(crate::error::not_enough_inputs(name)),
    }
}

fn color_arg(name: &str, value: &Value) -> Result<Color, LogoDiagnostic> {
    Color::from_value(value).ok_or_else(|| bad_input(name, value))
}

fn turtle_id(ev: &Evaluator<'_>, name: &str, value: &Value) -> Result<usize, LogoDiagnostic> {
    let id = usize::try_from(integer(name, value)?).map_err(|_| bad_input(name, value))?;
    if !ev.world.exists(id) {
        return Err(bad_input(name, value));
    }
    Ok(id)
}

// ── Movement ────────────────────────────────────────────────────────

fn forward(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    step(ev, name, &args[0], 1.0)
}

fn back(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    step(ev, name, &args[0], -1.0)
}

fn step(
    ev: &mut Evaluator<'_>,
    name: &str,
    distance: &Value,
    sign: f64,
) -> LogoResult<Option<Value>> {
    if !ev.world.forward(sign * float(name, distance)?) {
        return Err(bad_input(name, distance).into());
    }
    Ok(None)
}

fn right(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.right(float(name, &args[0])?);
    Ok(None)
}

fn left(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.right(-float(name, &args[0])?);
    Ok(None)
}

fn home(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.home();
    Ok(None)
}

fn setpos(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    list_arg(name, &args[0])?;
    let to = point_arg(name, args)?;
    ev.world.move_to(to);
    Ok(None)
}

fn setxy(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let to = point_arg(name, args)?;
    ev.world.move_to(to);
    Ok(None)
}

fn setx(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let x = float(name, &args[0])?;
    let y = ev.world.current().position.y;
    ev.world.move_to(Point { x, y });
    Ok(None)
}

fn sety(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let y = float(name, &args[0])?;
    let x = ev.world.current().position.x;
    ev.world.move_to(Point { x, y });
    Ok(None)
}

fn setheading(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_heading(float(name, &args[0])?);
    Ok(None)
}

// ── Screen and pen ──────────────────────────────────────────────────

fn clearscreen(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.clear_screen();
    Ok(None)
}

fn clean(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.clean();
    Ok(None)
}

fn penup(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_pen_down(false);
    Ok(None)
}

fn pendown(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_pen_down(true);
    Ok(None)
}

fn hideturtle(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_visible(false);
    Ok(None)
}

fn showturtle(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_visible(true);
    Ok(None)
}

fn setpencolor(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_pen_color(color_arg(name, &args[0])?);
    Ok(None)
}

/// A width, or a `[width height]` list of which the width is used.
fn setpensize(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let size = match &args[0] {
        Value::List(list) => match list.first() {
            Some(width) => float(name, width)?,
            None => return Err(bad_input(name, &args[0]).into()),
        },
        word => float(name, word)?,
    };
    if size < 0.0 {
        return Err(bad_input(name, &args[0]).into());
    }
    ev.world.set_pen_size(size);
    Ok(None)
}

fn setbackground(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.set_background(color_arg(name, &args[0])?);
    Ok(None)
}

// ── Shapes ──────────────────────────────────────────────────────────

fn circle(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.circle(float(name, &args[0])?);
    Ok(None)
}

fn arc(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let angle = float(name, &args[0])?;
    let radius = float(name, &args[1])?;
    ev.world.arc(angle, radius);
    Ok(None)
}

fn dot(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let size = args.first().map(|v| float(name, v)).transpose()?;
    ev.world.dot(size);
    Ok(None)
}

fn stamp(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.stamp();
    Ok(None)
}

fn fill(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.fill();
    Ok(None)
}

fn beginfill(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.begin_fill();
    Ok(None)
}

fn endfill(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.end_fill();
    Ok(None)
}

fn label(ev: &mut Evaluator<'_>, _name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.label(args[0].print_form());
    Ok(None)
}

// ── Queries ─────────────────────────────────────────────────────────

fn pos(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    let at = ev.world.current().position;
    Ok(Some(Value::List([real(at.x), real(at.y)].into_iter().collect())))
}

fn xcor(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(real(ev.world.current().position.x)))
}

fn ycor(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(real(ev.world.current().position.y)))
}

fn heading(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(real(ev.world.current().heading)))
}

fn towards(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let target = point_arg(name, args)?;
    Ok(Some(real(ev.world.towards(target))))
}

fn distance(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let target = point_arg(name, args)?;
    let d = ev.world.distance(target);
    if !d.is_finite() {
        return Err(bad_input(name, &args[0]).into());
    }
    Ok(Some(real(d)))
}

fn pencolor(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(ev.world.current().pen_color.to_value()))
}

fn pensize(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(real(ev.world.current().pen_size)))
}

fn pendownp(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(Value::boolean(ev.world.current().pen_down)))
}

fn shownp(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(Value::boolean(ev.world.current().visible)))
}

fn background(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(ev.world.background().to_value()))
}

// ── Multiple turtles ────────────────────────────────────────────────

fn createturtle(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    let id = ev.world.create_turtle();
    Ok(Some(id_value(id)))
}

fn clone(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    let id = ev.world.clone_turtle();
    Ok(Some(id_value(id)))
}

fn tell(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let id = turtle_id(ev, name, &args[0])?;
    ev.world.tell(id);
    Ok(None)
}

/// Run a list with another turtle (or each of a list of turtles) as the
/// current actor. The actor stack is restored however the list ends.
fn ask(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let ids = match &args[0] {
        Value::List(list) => list
            .iter()
            .map(|v| turtle_id(ev, name, v))
            .collect::<Result<Vec<_>, _>>()?,
        word => vec![turtle_id(ev, name, word)?],
    };
    let body: List = list_arg(name, &args[1])?.clone();
    let depth = ev.world.actor_depth();
    let mut result = Ok(None);
    for id in ids {
        ev.world.tell(id);
        result = ev.run_value(&body);
        ev.world.restore_actors(depth);
        if result.is_err() {
            break;
        }
    }
    result
}

fn removeactor(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.world.remove_actor();
    Ok(None)
}

fn who(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(id_value(ev.world.current_id())))
}

fn turtles(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(Value::List(ev.world.turtle_ids())))
}

#[cfg(test)]
mod tests {
    use crate::host::{Config, Interpreter, Outcome};
    use crate::turtle::{GraphicsOp, Point};

    fn run(logo: &mut Interpreter, source: &str) -> Outcome {
        let out = logo.execute(source);
        assert!(out.succeeded, "{source}: {:?}", out.error_message);
        out
    }

    fn shown(source: &str) -> String {
        let mut logo = Interpreter::with_config(Config::default());
        run(&mut logo, source).text_output
    }

    #[test]
    fn square_corner_position_and_heading() {
        let mut logo = Interpreter::new();
        run(&mut logo, "fd 100 rt 90 fd 100");
        let t = logo.turtle();
        assert_eq!(t.position, Point { x: 100.0, y: 100.0 });
        assert_eq!(t.heading, 90.0);
        assert_eq!(shown("fd 100 rt 90 fd 100 show pos print heading"), "[100 100]\n90\n");
    }

    #[test]
    fn moves_off_the_plane_are_refused() {
        let mut logo = Interpreter::new();
        run(&mut logo, "fd 1e308");
        let out = logo.execute("fd 1e308");
        assert!(!out.succeeded);
        assert_eq!(out.error_message.as_deref(), Some("fd doesn't like 1e308 as input"));
        assert_eq!(logo.turtle().position, Point { x: 0.0, y: 1e308 });
        assert!(run(&mut logo, "show pos").text_output.starts_with("[0 1e308]"));
    }

    #[test]
    fn back_and_left_are_negated() {
        assert_eq!(shown("bk 30 lt 90 show pos print heading"), "[0 -30]\n270\n");
    }

    #[test]
    fn set_position_forms() {
        assert_eq!(shown("setpos [3 4] show pos"), "[3 4]\n");
        assert_eq!(shown("setxy 1 2 setx 5 show pos"), "[5 2]\n");
        assert_eq!(shown("sety -7 print ycor"), "-7\n");
        assert_eq!(shown("setxy 3 4 print distance [0 0]"), "5\n");
        assert_eq!(shown("print (towards 10 0)"), "90\n");
    }

    #[test]
    fn pen_state_queries() {
        assert_eq!(
            shown("pu print pendownp setpc [255 0 0] show pencolor setpensize 3 print pensize"),
            "false\n[255 0 0]\n3\n"
        );
        assert_eq!(shown("ht print shownp setbg \"black print bg"), "false\nblack\n");
    }

    #[test]
    fn pen_up_moves_without_lines() {
        let mut logo = Interpreter::new();
        let out = run(&mut logo, "pu fd 10 pd fd 10");
        let lines = out
            .graphics
            .iter()
            .filter(|e| matches!(e.op, GraphicsOp::Line { .. }))
            .count();
        assert_eq!(lines, 1);
    }

    #[test]
    fn bad_color_is_rejected() {
        let mut logo = Interpreter::new();
        let out = logo.execute("setpc [1 2]");
        assert_eq!(out.error_message.as_deref(), Some("setpc doesn't like [1 2] as input"));
    }

    #[test]
    fn ask_restores_the_actor() {
        let mut logo = Interpreter::new();
        run(&mut logo, "make \"t createturtle tell 0");
        let out = run(&mut logo, "ask :t [fd 50] print who show turtles");
        assert_eq!(out.text_output, "0\n[0 1]\n");
        assert!(out.graphics.iter().all(|e| e.turtle == 1));
        assert_eq!(logo.turtle().position, Point::ORIGIN);
        let out = logo.execute("ask :t [print who fd :nothing]");
        assert!(!out.succeeded);
        assert_eq!(out.text_output, "1\n");
        assert_eq!(logo.turtles().current_id(), 0);
    }

    #[test]
    fn tell_and_removeactor() {
        assert_eq!(shown("ignore createturtle print who removeactor print who"), "1\n0\n");
        assert_eq!(shown("removeactor removeactor print who"), "0\n");
        let mut logo = Interpreter::new();
        let out = logo.execute("tell 5");
        assert_eq!(out.error_message.as_deref(), Some("tell doesn't like 5 as input"));
    }

    #[test]
    fn clone_copies_state() {
        assert_eq!(shown("fd 20 rt 45 ignore clone show pos print heading print who"), "[0 20]\n45\n1\n");
    }
}
