#[macro_export]
macro_rules! dummy {
    ($t:expr) => {
        ()
    };
}

#[macro_export]
macro_rules! mailbox_def {
    (
        $(#[doc = $doc:expr])*
        $name:ident => {
            $(
                $(#[doc = $mb_doc:expr])*
                $mb:ident => $regs:expr
            ),*
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, ufmt::derive::uDebug)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $name {
            $(
                $(#[doc = $mb_doc])*
                $mb,
            )*
        }

        impl $name {
            #[doc = concat!("All valid options for [`", stringify!($name), "`].")]
            pub const ALL: [Self; <[_]>::len(&[$($crate::dummy!($mb)),*])] = [$(Self::$mb),*];

            #[doc = concat!("Returns the `MIR`, `MDTR`, `MDLR`, `MDHR` registers (in that order) based on the variant of [`", stringify!($name), "`].")]
            pub const fn registers(self) -> [$crate::regs::Register; 4] {
                match self {
                    $(Self::$mb => $regs,)*
                }
            }

            /// Identifier register.
            #[inline]
            pub const fn mir(self) -> $crate::regs::Register {
                self.registers()[0]
            }

            /// Data length register.
            #[inline]
            pub const fn mdtr(self) -> $crate::regs::Register {
                self.registers()[1]
            }

            /// Low data register, bytes 0-3.
            #[inline]
            pub const fn mdlr(self) -> $crate::regs::Register {
                self.registers()[2]
            }

            /// High data register, bytes 4-7.
            #[inline]
            pub const fn mdhr(self) -> $crate::regs::Register {
                self.registers()[3]
            }
        }
    };
}
