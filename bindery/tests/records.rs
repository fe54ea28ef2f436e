//! Binding of records: round trips, wire names, inheritance and overrides.

use std::sync::Arc;

use bindery::builtin::TypedFactory;
use bindery::{
    Codec, CodecFactory, CodecRegistry, Config, Describe, ErrorKind, Excluder, ExclusionStrategy,
    FieldNaming, JsonReader, JsonWriter, Member, Record, RecordShape, Resolution,
    TypeDescriptor, TypedCodec,
};
use bindery_testhelpers::{IPanic, setup};

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    street: String,
    zip: Option<u32>,
}

impl Record for Address {
    const NAME: &'static str = "Address";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("street", |a: &Self| &a.street, |a| &mut a.street))
            .member(Member::nullable("zip", |a: &Self| &a.zip, |a| &mut a.zip))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    name: String,
    age: u8,
    score: f64,
    initial: char,
    active: bool,
    tags: Vec<String>,
    home: Option<Address>,
    previous: Vec<Address>,
}

impl Record for Person {
    const NAME: &'static str = "Person";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("name", |p: &Self| &p.name, |p| &mut p.name))
            .member(Member::required("age", |p: &Self| &p.age, |p| &mut p.age))
            .member(Member::required("score", |p: &Self| &p.score, |p| &mut p.score))
            .member(Member::required("initial", |p: &Self| &p.initial, |p| &mut p.initial))
            .member(Member::required("active", |p: &Self| &p.active, |p| &mut p.active))
            .member(Member::required("tags", |p: &Self| &p.tags, |p| &mut p.tags))
            .member(Member::nullable("home", |p: &Self| &p.home, |p| &mut p.home))
            .member(Member::required("previous", |p: &Self| &p.previous, |p| &mut p.previous))
    }
}

fn sample_person() -> Person {
    Person {
        name: "Ada".into(),
        age: 36,
        score: 0.25,
        initial: 'A',
        active: true,
        tags: vec!["math".into(), "engines".into()],
        home: Some(Address {
            street: "St James's Square".into(),
            zip: None,
        }),
        previous: vec![
            Address {
                street: "Marylebone".into(),
                zip: Some(1),
            },
            Address::default(),
        ],
    }
}

#[test]
fn nested_records_round_trip() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let person = sample_person();
    let json = registry.to_string(&person)?;
    let back: Option<Person> = registry.from_str(&json)?;
    assert_eq!(back, Some(person));
    Ok(())
}

#[test]
fn members_are_written_in_declaration_order() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let json = registry.to_string(&sample_person())?;
    assert_eq!(
        json,
        r#"{"name":"Ada","age":36,"score":0.25,"initial":"A","active":true,"tags":["math","engines"],"home":{"street":"St James's Square"},"previous":[{"street":"Marylebone","zip":1},{"street":""}]}"#
            .replace('\'', "\\u0027")
    );
    Ok(())
}

#[test]
fn unknown_names_are_skipped() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let json = r#"{"extra":{"deep":[1,{"x":null}]},"street":"Main","zip":7,"more":false}"#;
    let address: Option<Address> = registry.from_str(json)?;
    assert_eq!(
        address,
        Some(Address {
            street: "Main".into(),
            zip: Some(7),
        })
    );
    Ok(())
}

#[test]
fn null_leaves_required_storage_untouched() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let address: Option<Address> = registry.from_str(r#"{"street":null,"zip":null}"#)?;
    assert_eq!(address, Some(Address::default()));
    Ok(())
}

#[test]
fn out_of_range_narrow_integer_is_reported() {
    setup();
    let registry = CodecRegistry::default();
    let err = registry.from_str::<Person>(r#"{"age":300}"#).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::NumberOutOfRange { target_type: "u8", .. }
    ));
}

#[test]
fn null_list_element_is_rejected() {
    setup();
    let registry = CodecRegistry::default();
    let err = registry.from_str::<Person>(r#"{"tags":["a",null]}"#).unwrap_err();
    assert_eq!(err.code(), "bindery::unexpected_null");
}

#[derive(Debug, Default, PartialEq)]
struct Item {
    id: i64,
}

impl Record for Item {
    const NAME: &'static str = "Item";

    fn shape() -> RecordShape<Self> {
        RecordShape::new().member(
            Member::required("id", |i: &Self| &i.id, |i| &mut i.id)
                .alias("identifier")
                .alias("id"),
        )
    }
}

#[test]
fn aliases_are_read_only() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let item: Option<Item> = registry.from_str(r#"{"identifier": 5}"#)?;
    let item = item.unwrap();
    assert_eq!(item, Item { id: 5 });
    assert_eq!(registry.to_string(&item)?, r#"{"id":5}"#);
    Ok(())
}

#[derive(Debug, Default)]
struct Base {
    id: u32,
}

impl Record for Base {
    const NAME: &'static str = "Base";

    fn shape() -> RecordShape<Self> {
        RecordShape::new().member(Member::required("id", |b: &Self| &b.id, |b| &mut b.id))
    }
}

#[derive(Debug, Default)]
struct Clashing {
    base: Base,
    ident: u32,
}

impl Record for Clashing {
    const NAME: &'static str = "Clashing";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("ident", |c: &Self| &c.ident, |c| &mut c.ident).rename("id"))
            .extends(|c: &Self| &c.base, |c| &mut c.base)
    }
}

#[derive(Debug, Default)]
struct Derived {
    base: Base,
    label: String,
}

impl Record for Derived {
    const NAME: &'static str = "Derived";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("label", |d: &Self| &d.label, |d| &mut d.label))
            .extends(|d: &Self| &d.base, |d| &mut d.base)
    }
}

#[test]
fn duplicate_wire_name_across_ancestors_fails_at_build_time() {
    setup();
    let registry = CodecRegistry::default();
    let ty = Clashing::descriptor();
    for _ in 0..2 {
        let err = registry.resolve(&ty).err().unwrap();
        match err.kind {
            ErrorKind::DuplicateWireName { type_name, name } => {
                assert_eq!(type_name, "Clashing");
                assert_eq!(name, "id");
            }
            other => panic!("expected a duplicate name, got {other}"),
        }
        assert!(registry.cached(&ty).is_none());
    }
}

#[test]
fn ancestor_members_follow_own_members() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let value = Derived {
        base: Base { id: 4 },
        label: "four".into(),
    };
    assert_eq!(registry.to_string(&value)?, r#"{"label":"four","id":4}"#);

    let back: Derived = registry.from_str(r#"{"id":9,"label":"nine"}"#)?.unwrap();
    assert_eq!(back.base.id, 9);
    assert_eq!(back.label, "nine");
    Ok(())
}

#[derive(Debug, Default)]
struct Failure {
    code: u32,
}

impl Record for Failure {
    const NAME: &'static str = "Failure";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("code", |f: &Self| &f.code, |f| &mut f.code))
            // the accessor yields the owner itself
            .member(Member::required("cause", |f: &Self| f, |f| f))
    }
}

#[test]
fn member_referring_to_its_owner_is_not_written() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    assert_eq!(registry.to_string(&Failure { code: 3 })?, r#"{"code":3}"#);
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Profile {
    first_name: String,
    last_name: String,
}

impl Record for Profile {
    const NAME: &'static str = "Profile";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("first_name", |p: &Self| &p.first_name, |p| {
                &mut p.first_name
            }))
            .member(
                Member::required("last_name", |p: &Self| &p.last_name, |p| &mut p.last_name)
                    .rename("surname"),
            )
    }
}

#[test]
fn naming_policy_applies_unless_renamed() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::new(Config::default().naming(FieldNaming::UpperCamelCase));
    let profile = Profile {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
    };
    let json = registry.to_string(&profile)?;
    assert_eq!(json, r#"{"FirstName":"Grace","surname":"Hopper"}"#);
    assert_eq!(registry.from_str::<Profile>(&json)?, Some(profile));
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Versioned {
    id: u32,
    nick: Option<String>,
    password: String,
}

impl Record for Versioned {
    const NAME: &'static str = "Versioned";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("id", |v: &Self| &v.id, |v| &mut v.id))
            .member(Member::nullable("nick", |v: &Self| &v.nick, |v| &mut v.nick).since(2.0))
            .member(
                Member::required("password", |v: &Self| &v.password, |v| &mut v.password)
                    .transient(),
            )
    }
}

#[test]
fn excluded_members_are_neither_written_nor_read() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::new(
        Config::default().excluder(Excluder::default().with_version(1.0)),
    );
    let value = Versioned {
        id: 1,
        nick: Some("n".into()),
        password: "hunter2".into(),
    };
    assert_eq!(registry.to_string(&value)?, r#"{"id":1}"#);

    let back: Versioned =
        registry.from_str(r#"{"id":2,"nick":"m","password":"x"}"#)?.unwrap();
    assert_eq!(
        back,
        Versioned {
            id: 2,
            nick: None,
            password: String::new(),
        }
    );

    let current = CodecRegistry::new(
        Config::default().excluder(Excluder::default().with_version(2.0)),
    );
    assert_eq!(current.to_string(&value)?, r#"{"id":1,"nick":"n"}"#);
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Secret {
    value: String,
}

impl Record for Secret {
    const NAME: &'static str = "Secret";

    fn shape() -> RecordShape<Self> {
        RecordShape::new().member(Member::required("value", |s: &Self| &s.value, |s| &mut s.value))
    }
}

#[derive(Debug, Default, PartialEq)]
struct Vault {
    owner: String,
    secret: Option<Secret>,
}

impl Record for Vault {
    const NAME: &'static str = "Vault";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("owner", |v: &Self| &v.owner, |v| &mut v.owner))
            .member(Member::nullable("secret", |v: &Self| &v.secret, |v| &mut v.secret))
    }
}

struct SkipSecrets;

impl ExclusionStrategy for SkipSecrets {
    fn skip_type(&self, ty: &TypeDescriptor) -> bool {
        ty.is::<Secret>()
    }
}

#[test]
fn excluded_type_is_null_on_the_wire() -> Result<(), IPanic> {
    setup();
    let excluder = Excluder::default().with_strategy(SkipSecrets, true, true);
    let registry = CodecRegistry::new(Config::default().serialize_nulls().excluder(excluder));
    let secret = Secret {
        value: "s3cr3t".into(),
    };
    assert_eq!(registry.to_string(&secret)?, "null");
    assert_eq!(registry.from_str::<Secret>(r#"{"value":"x"}"#)?, None);

    // members of an excluded type are dropped from their owner
    let vault = Vault {
        owner: "me".into(),
        secret: Some(secret),
    };
    assert_eq!(registry.to_string(&vault)?, r#"{"owner":"me"}"#);
    Ok(())
}

#[test]
fn type_excluded_in_one_direction_still_reads() -> Result<(), IPanic> {
    setup();
    let excluder = Excluder::default().with_strategy(SkipSecrets, true, false);
    let registry = CodecRegistry::new(Config::default().excluder(excluder));
    let secret = Secret {
        value: "s3cr3t".into(),
    };
    assert_eq!(registry.to_string(&secret)?, "null");
    let read = registry.from_str::<Secret>(r#"{"value":"x"}"#)?;
    assert_eq!(read, Some(Secret { value: "x".into() }));
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Page<T> {
    items: Vec<T>,
    total: u32,
}

impl<T: Describe + Default> Record for Page<T> {
    const NAME: &'static str = "Page";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(Member::required("items", |p: &Self| &p.items, |p| &mut p.items))
            .member(Member::required("total", |p: &Self| &p.total, |p| &mut p.total))
    }

    fn type_params() -> Vec<TypeDescriptor> {
        vec![T::descriptor()]
    }
}

#[test]
fn generic_records_resolve_per_instantiation() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let numbers = Page::<u32> {
        items: vec![1, 2],
        total: 2,
    };
    let addresses = Page::<Address> {
        items: vec![Address::default()],
        total: 1,
    };
    assert_eq!(registry.to_string(&numbers)?, r#"{"items":[1,2],"total":2}"#);
    assert_eq!(registry.to_string(&addresses)?, r#"{"items":[{"street":""}],"total":1}"#);

    let numbers_ty = Page::<u32>::descriptor();
    let addresses_ty = Page::<Address>::descriptor();
    assert_ne!(numbers_ty, addresses_ty);
    assert_eq!(numbers_ty.to_string(), "Page<u32>");
    assert_eq!(addresses_ty.to_string(), "Page<Address>");
    assert!(registry.cached(&numbers_ty).is_some());
    assert!(registry.cached(&addresses_ty).is_some());

    let back: Option<Page<Address>> = registry.from_str(r#"{"items":[{"street":"x"}],"total":1}"#)?;
    assert_eq!(back.unwrap().items[0].street, "x");
    Ok(())
}

/// Writes strings upper-cased and reads them back lower-cased.
struct Shouting;

impl TypedCodec for Shouting {
    type Value = String;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &String) -> bindery::Result<()> {
        Ok(out.string_value(&value.to_uppercase())?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> bindery::Result<String> {
        Ok(input.next_string()?.to_lowercase())
    }
}

/// Defers to whatever the registry would use after the user factories.
struct Fallthrough;

impl CodecFactory for Fallthrough {
    fn try_create(
        &self,
        cx: &mut Resolution<'_>,
        ty: &TypeDescriptor,
    ) -> bindery::Result<Option<Arc<dyn Codec>>> {
        cx.resolve_skipping(self, ty).map(Some)
    }
}

#[derive(Debug, Default, PartialEq)]
struct Letter {
    greeting: String,
    body: String,
    to: Option<Address>,
}

impl Record for Letter {
    const NAME: &'static str = "Letter";

    fn shape() -> RecordShape<Self> {
        RecordShape::new()
            .member(
                Member::required("greeting", |l: &Self| &l.greeting, |l| &mut l.greeting)
                    .codec(TypedFactory::new(Shouting)),
            )
            .member(Member::required("body", |l: &Self| &l.body, |l| &mut l.body))
            .member(Member::nullable("to", |l: &Self| &l.to, |l| &mut l.to).codec(Fallthrough))
    }
}

#[test]
fn per_member_codec_overrides() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::default();
    let letter = Letter {
        greeting: "hello".into(),
        body: "hi there".into(),
        to: Some(Address {
            street: "Elm".into(),
            zip: Some(2),
        }),
    };
    let json = registry.to_string(&letter)?;
    assert_eq!(
        json,
        r#"{"greeting":"HELLO","body":"hi there","to":{"street":"Elm","zip":2}}"#
    );
    assert_eq!(registry.from_str::<Letter>(&json)?, Some(letter));
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb(u8, u8, u8);

impl Describe for Rgb {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::opaque::<Rgb>("Rgb")
    }
}

struct HexColor;

impl TypedCodec for HexColor {
    type Value = Rgb;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &Rgb) -> bindery::Result<()> {
        let Rgb(r, g, b) = *value;
        Ok(out.string_value(&format!("#{r:02x}{g:02x}{b:02x}"))?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> bindery::Result<Rgb> {
        let text = input.next_string()?;
        let channel = |i: usize| {
            text.get(i..i + 2)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| {
                    bindery::Error::new(ErrorKind::TypeMismatch {
                        expected: "a #rrggbb color".into(),
                        got: text.clone(),
                    })
                })
        };
        Ok(Rgb(channel(1)?, channel(3)?, channel(5)?))
    }
}

#[test]
fn opaque_types_need_a_user_factory() -> Result<(), IPanic> {
    setup();
    let plain = CodecRegistry::default();
    let err = plain.to_string(&Rgb(1, 2, 3)).unwrap_err();
    match err.kind {
        ErrorKind::UnsupportedType { type_name } => assert_eq!(type_name, "Rgb"),
        other => panic!("expected an unsupported type, got {other}"),
    }

    let registry = CodecRegistry::builder()
        .register(TypedFactory::new(HexColor))
        .build();
    let json = registry.to_string(&vec![Rgb(255, 0, 16)])?;
    assert_eq!(json, r##"["#ff0010"]"##);
    assert_eq!(registry.from_str::<Vec<Rgb>>(&json)?, Some(vec![Rgb(255, 0, 16)]));
    Ok(())
}

#[test]
fn user_factories_take_precedence_over_builtins() -> Result<(), IPanic> {
    setup();
    let registry = CodecRegistry::builder()
        .register(TypedFactory::new(Shouting))
        .build();
    let value = Address {
        street: "elm".into(),
        zip: None,
    };
    assert_eq!(registry.to_string(&value)?, r#"{"street":"ELM"}"#);
    Ok(())
}

#[test]
fn expose_flags_need_require_expose() -> Result<(), IPanic> {
    setup();

    #[derive(Debug, Default, PartialEq)]
    struct Token {
        id: u32,
        secret: String,
        hint: String,
    }

    impl Record for Token {
        const NAME: &'static str = "Token";

        fn shape() -> RecordShape<Self> {
            RecordShape::new()
                .member(Member::required("id", |t: &Self| &t.id, |t| &mut t.id).expose(true, true))
                .member(
                    Member::required("secret", |t: &Self| &t.secret, |t| &mut t.secret)
                        .expose(false, true),
                )
                .member(Member::required("hint", |t: &Self| &t.hint, |t| &mut t.hint))
        }
    }

    let registry =
        CodecRegistry::new(Config::default().excluder(Excluder::default().require_expose()));
    let token = Token {
        id: 1,
        secret: "s".into(),
        hint: "h".into(),
    };
    assert_eq!(registry.to_string(&token)?, r#"{"id":1}"#);
    let back: Token = registry
        .from_str(r#"{"id":2,"secret":"t","hint":"i"}"#)?
        .unwrap();
    assert_eq!(
        back,
        Token {
            id: 2,
            secret: "t".into(),
            hint: String::new(),
        }
    );

    Ok(())
}
